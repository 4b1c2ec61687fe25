//! # Mealprep Tesco
//!
//! Retailer product catalog for the meal prep agent.
//!
//! ## Core Concepts
//! - **Product**: One catalog listing with price, promotion, and nutrition
//! - **Backends**: Live web search (embedded GraphQL cache extraction),
//!   hosted scraping actor, and a deterministic mock
//! - **Catalog**: Facade picking a backend, with mock fallback when the
//!   retailer blocks or returns nothing
//! - **Nutrition cache**: File-backed store so product pages are fetched
//!   once per product, with stats and CSV export

pub mod api;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod mock;
pub mod product;
pub mod web;

pub use api::ApiCatalog;
pub use cache::{CacheStats, NutritionCache, PopularProduct};
pub use catalog::{Catalog, CatalogBackend, CatalogConfig, DEFAULT_BASE_URL};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use extract::{brand_from_title, reference_nutrition};
pub use mock::MockCatalog;
pub use product::{Availability, CatalogSource, NutritionFacts, Product};
pub use web::WebCatalog;
