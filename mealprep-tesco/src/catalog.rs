//! Catalog facade and backend selection
//!
//! One entry point over the three product backends. The facade owns the
//! nutrition cache and the mock fallback so the tool layer never has to
//! care which backend is live or whether the retailer is blocking us.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::ApiCatalog;
use crate::cache::{product_key, CacheStats, NutritionCache};
use crate::error::Result;
use crate::extract::reference_nutrition;
use crate::mock::MockCatalog;
use crate::product::{Availability, CatalogSource, Product};
use crate::web::WebCatalog;

pub const DEFAULT_BASE_URL: &str = "https://www.tesco.com";

/// Backend-independent product lookups.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Search the catalog, returning up to `limit` products.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>>;

    /// Fetch one product's details, nutrition included when available.
    async fn product_details(&self, url: &str) -> Result<Product>;

    /// Which backend this is, for logs and product provenance.
    fn source(&self) -> CatalogSource;
}

/// Catalog construction options.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub politeness_delay_ms: u64,
    pub fallback_to_mock: bool,
    pub cache_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            source: CatalogSource::Web,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: 15,
            politeness_delay_ms: 2000,
            fallback_to_mock: true,
            cache_path: None,
        }
    }
}

impl CatalogConfig {
    /// Offline catalog: deterministic products, no network, no fallback.
    pub fn mock() -> Self {
        CatalogConfig {
            source: CatalogSource::Mock,
            fallback_to_mock: false,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: CatalogSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_politeness_delay_ms(mut self, millis: u64) -> Self {
        self.politeness_delay_ms = millis;
        self
    }

    pub fn with_fallback_to_mock(mut self, enabled: bool) -> Self {
        self.fallback_to_mock = enabled;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// The product catalog the agent tools talk to.
pub struct Catalog {
    backend: Box<dyn CatalogBackend>,
    mock: MockCatalog,
    fallback_to_mock: bool,
    cache: Option<NutritionCache>,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let backend: Box<dyn CatalogBackend> = match config.source {
            CatalogSource::Web => Box::new(WebCatalog::new(&config)?),
            CatalogSource::Api => Box::new(ApiCatalog::new(&config)?),
            CatalogSource::Mock => Box::new(MockCatalog::new()),
        };

        let cache = config.cache_path.as_ref().map(NutritionCache::open);
        if let Some(path) = &config.cache_path {
            tracing::debug!(path = %path.display(), "nutrition cache enabled");
        }

        Ok(Catalog {
            backend,
            mock: MockCatalog::new(),
            fallback_to_mock: config.fallback_to_mock,
            cache,
        })
    }

    pub fn source(&self) -> CatalogSource {
        self.backend.source()
    }

    /// Search the active backend. Retryable failures and empty results fall
    /// back to the mock catalog when enabled, so the agent always has
    /// something to plan with.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        match self.backend.search(query, limit).await {
            Ok(products) if products.is_empty() && self.fallback_to_mock => {
                tracing::warn!(
                    query = query,
                    source = %self.backend.source(),
                    "search returned nothing, falling back to mock catalog"
                );
                self.mock.search(query, limit).await
            }
            Ok(products) => Ok(products),
            Err(err) if err.is_retryable() && self.fallback_to_mock => {
                tracing::warn!(
                    query = query,
                    error = %err,
                    "search failed, falling back to mock catalog"
                );
                self.mock.search(query, limit).await
            }
            Err(err) => Err(err),
        }
    }

    /// Product details with the nutrition cache in front of the backend.
    ///
    /// A cache hit skips the fetch entirely and returns a product shell
    /// carrying the cached name and nutrition.
    pub async fn product_details(&mut self, url: &str) -> Result<Product> {
        if let Some((name, facts)) = self.cache.as_mut().and_then(|c| c.get_entry(url)) {
            tracing::debug!(url = url, "nutrition served from cache");
            return Ok(Product {
                id: product_key(url),
                name,
                brand: String::new(),
                url: url.to_string(),
                price: None,
                display_price: None,
                unit_price: None,
                promotion: None,
                image_url: None,
                availability: Availability::Unknown,
                nutrition: Some(facts),
                source: self.backend.source(),
            });
        }

        let mut product = self.backend.product_details(url).await?;
        if product.nutrition.is_none() {
            product.nutrition = reference_nutrition(&product.name);
        }

        if let Some(cache) = self.cache.as_mut() {
            if let Some(facts) = product.nutrition.clone() {
                if let Err(err) = cache.insert(&product.name, url, facts) {
                    tracing::warn!(error = %err, "failed to store nutrition in cache");
                }
            }
        }

        Ok(product)
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    pub fn cache(&self) -> Option<&NutritionCache> {
        self.cache.as_ref()
    }

    pub fn cache_mut(&mut self) -> Option<&mut NutritionCache> {
        self.cache.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{invalid_argument, network_failed};
    use tempfile::TempDir;

    struct FailingBackend {
        retryable: bool,
    }

    #[async_trait]
    impl CatalogBackend for FailingBackend {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Product>> {
            if self.retryable {
                Err(network_failed("connection reset").temporary())
            } else {
                Err(invalid_argument("bad query"))
            }
        }

        async fn product_details(&self, _url: &str) -> Result<Product> {
            Err(network_failed("connection reset").temporary())
        }

        fn source(&self) -> CatalogSource {
            CatalogSource::Web
        }
    }

    fn catalog_with(backend: Box<dyn CatalogBackend>, fallback: bool) -> Catalog {
        Catalog {
            backend,
            mock: MockCatalog::new(),
            fallback_to_mock: fallback,
            cache: None,
        }
    }

    #[tokio::test]
    async fn test_mock_catalog_search() {
        let catalog = Catalog::new(CatalogConfig::mock()).unwrap();
        assert_eq!(catalog.source(), CatalogSource::Mock);

        let products = catalog.search("chicken", 5).await.unwrap();
        assert_eq!(products.len(), 2);
        assert!(products[0].name.contains("Chicken"));
    }

    #[tokio::test]
    async fn test_retryable_failure_falls_back_to_mock() {
        let catalog = catalog_with(Box::new(FailingBackend { retryable: true }), true);
        let products = catalog.search("chicken", 5).await.unwrap();

        assert!(!products.is_empty());
        assert_eq!(products[0].source, CatalogSource::Mock);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_propagates() {
        let catalog = catalog_with(Box::new(FailingBackend { retryable: false }), true);
        assert!(catalog.search("chicken", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_without_fallback_propagates() {
        let catalog = catalog_with(Box::new(FailingBackend { retryable: true }), false);
        assert!(catalog.search("chicken", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_product_details_populates_and_hits_cache() {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::mock().with_cache_path(dir.path().join("cache.json"));
        let mut catalog = Catalog::new(config).unwrap();

        let products = catalog.search("chicken", 1).await.unwrap();
        let url = products[0].url.clone();

        let first = catalog.product_details(&url).await.unwrap();
        assert!(first.nutrition.is_some());
        assert_eq!(catalog.cache_stats().unwrap().total_cache_hits, 0);

        let second = catalog.product_details(&url).await.unwrap();
        assert_eq!(second.name, first.name);
        assert!(second.nutrition.is_some());
        assert_eq!(catalog.cache_stats().unwrap().total_cache_hits, 1);
    }
}
