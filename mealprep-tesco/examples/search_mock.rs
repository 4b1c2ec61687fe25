//! Example: Search the offline mock catalog
//!
//! Run with:
//!   cargo run --example search_mock
//!
//!   # Custom query:
//!   cargo run --example search_mock -- "salmon fillets"

use mealprep_tesco::{Catalog, CatalogConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let query = env::args().nth(1).unwrap_or_else(|| "chicken breast".to_string());

    let catalog = Catalog::new(CatalogConfig::mock())?;
    let products = catalog.search(&query, 5).await?;

    println!("=== {} results for '{}' ===\n", products.len(), query);
    for product in &products {
        println!("{}", product.name);
        println!("  brand:   {}", product.brand);
        println!(
            "  price:   {} ({})",
            product.display_price.as_deref().unwrap_or("-"),
            product.unit_price.as_deref().unwrap_or("no unit price")
        );
        if let Some(promotion) = &product.promotion {
            println!("  promo:   {}", promotion);
        }
        if let Some(nutrition) = &product.nutrition {
            println!(
                "  per 100g: {} / {} protein / {} carbs / {} fat",
                nutrition.energy.as_deref().unwrap_or("-"),
                nutrition.protein.as_deref().unwrap_or("-"),
                nutrition.carbs.as_deref().unwrap_or("-"),
                nutrition.fat.as_deref().unwrap_or("-"),
            );
        }
        println!();
    }

    Ok(())
}
