//! Deterministic offline catalog
//!
//! Products mirror real listings closely enough to exercise recipe and
//! nutrition logic without touching the network. Also the fallback target
//! when a live backend is blocked or comes back empty.

use async_trait::async_trait;

use crate::catalog::{CatalogBackend, DEFAULT_BASE_URL};
use crate::error::{Error, ErrorKind, Result};
use crate::product::{Availability, CatalogSource, NutritionFacts, Product, DEFAULT_IMAGE_URL};

pub struct MockCatalog {
    entries: Vec<(&'static str, Vec<Product>)>,
}

fn mock_product(
    id: &str,
    name: &str,
    brand: &str,
    price: f64,
    unit_price: Option<&str>,
    promotion: Option<&str>,
    nutrition: NutritionFacts,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: brand.to_string(),
        url: Product::product_page_url(DEFAULT_BASE_URL, id),
        price: Some(price),
        display_price: Some(Product::format_price(price)),
        unit_price: unit_price.map(str::to_string),
        promotion: promotion.map(str::to_string),
        image_url: Some(DEFAULT_IMAGE_URL.to_string()),
        availability: Availability::Available,
        nutrition: Some(nutrition),
        source: CatalogSource::Mock,
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        let entries = vec![
            (
                "chicken",
                vec![
                    mock_product(
                        "254892116",
                        "Tesco British Chicken Breast Fillets 640G",
                        "Tesco",
                        4.50,
                        Some("£0.70/100g"),
                        None,
                        NutritionFacts::per_100g("106kcal", "23.1g", "0g", "1.9g", "0.22g"),
                    ),
                    mock_product(
                        "254892117",
                        "Tesco Organic Chicken Breast Fillets 450G",
                        "Tesco Organic",
                        6.00,
                        Some("£1.33/100g"),
                        None,
                        NutritionFacts::per_100g("106kcal", "23.1g", "0g", "1.9g", "0.22g"),
                    ),
                ],
            ),
            (
                "broccoli",
                vec![mock_product(
                    "254892118",
                    "Tesco Broccoli Each",
                    "Tesco",
                    1.10,
                    Some("£1.10/each"),
                    None,
                    NutritionFacts::per_100g("25kcal", "3.0g", "2.0g", "0.4g", "0.01g"),
                )],
            ),
            (
                "rice",
                vec![mock_product(
                    "254892119",
                    "Tesco Basmati Rice 1Kg",
                    "Tesco",
                    2.50,
                    Some("£0.25/100g"),
                    Some("Clubcard Price £2.00"),
                    NutritionFacts::per_100g("349kcal", "7.9g", "77.8g", "0.6g", "0.01g"),
                )],
            ),
            (
                "yogurt",
                vec![mock_product(
                    "254892120",
                    "Tesco Greek Style Natural Yogurt 500G",
                    "Tesco",
                    1.75,
                    Some("£0.35/100g"),
                    None,
                    NutritionFacts::per_100g("115kcal", "9.0g", "4.5g", "6.4g", "0.13g"),
                )],
            ),
            (
                "milk",
                vec![
                    mock_product(
                        "254892121",
                        "Tesco British Semi Skimmed Milk 2.272L 4 Pints",
                        "Tesco",
                        1.55,
                        Some("£0.68/litre"),
                        None,
                        NutritionFacts::per_100g("46kcal", "3.4g", "4.8g", "1.7g", "0.13g"),
                    ),
                    mock_product(
                        "254892122",
                        "Tesco Organic Whole Milk 1L",
                        "Tesco Organic",
                        1.30,
                        Some("£1.30/litre"),
                        None,
                        NutritionFacts::per_100g("66kcal", "3.3g", "4.7g", "3.6g", "0.13g"),
                    ),
                ],
            ),
            (
                "bread",
                vec![mock_product(
                    "254892123",
                    "Tesco Wholemeal Bread 800G",
                    "Tesco",
                    1.10,
                    Some("£0.14/100g"),
                    None,
                    NutritionFacts::per_100g("247kcal", "8.7g", "45.8g", "2.2g", "1.0g"),
                )],
            ),
            (
                "eggs",
                vec![mock_product(
                    "254892124",
                    "Tesco Free Range Eggs Medium 12 Pack",
                    "Tesco",
                    2.40,
                    Some("£0.20/each"),
                    None,
                    NutritionFacts::per_100g("131kcal", "12.6g", "0.8g", "9.0g", "0.39g"),
                )],
            ),
            (
                "salmon",
                vec![mock_product(
                    "254892125",
                    "Tesco Scottish Salmon Fillets 240G",
                    "Tesco",
                    3.95,
                    Some("£1.65/100g"),
                    None,
                    NutritionFacts::per_100g("199kcal", "20.4g", "0g", "13.1g", "0.15g"),
                )],
            ),
            (
                "pasta",
                vec![mock_product(
                    "254892126",
                    "Tesco Penne Pasta 500G",
                    "Tesco",
                    0.75,
                    Some("£0.15/100g"),
                    None,
                    NutritionFacts::per_100g("352kcal", "12.0g", "71.0g", "1.5g", "0.01g"),
                )],
            ),
            (
                "beef",
                vec![mock_product(
                    "254892127",
                    "Tesco Lean Beef Steak Mince 5% Fat 500G",
                    "Tesco",
                    3.49,
                    Some("£0.70/100g"),
                    None,
                    NutritionFacts::per_100g("123kcal", "21.8g", "0g", "4.1g", "0.20g"),
                )],
            ),
        ];

        MockCatalog { entries }
    }

    /// Stand-in listing for queries no category covers, so the agent can
    /// keep planning instead of dead-ending.
    fn generic_product(&self, query: &str) -> Product {
        mock_product(
            "254890000",
            &format!("Tesco {}", title_case(query)),
            "Tesco",
            2.00,
            None,
            None,
            NutritionFacts::per_100g("120kcal", "4.0g", "15.0g", "4.0g", "0.10g"),
        )
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogBackend for MockCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        let query_lower = query.to_lowercase();
        let words: Vec<&str> = query_lower.split_whitespace().collect();

        let mut results = Vec::new();
        for (category, products) in &self.entries {
            if words.iter().any(|w| category.contains(w) || w.contains(category)) {
                results.extend(products.iter().cloned());
            } else {
                results.extend(
                    products
                        .iter()
                        .filter(|p| {
                            let name = p.name.to_lowercase();
                            words.iter().any(|w| name.contains(w))
                        })
                        .cloned(),
                );
            }
        }

        if results.is_empty() {
            results.push(self.generic_product(query));
        }
        results.truncate(limit);

        tracing::debug!(query = query, found = results.len(), "mock catalog search");
        Ok(results)
    }

    async fn product_details(&self, url: &str) -> Result<Product> {
        self.entries
            .iter()
            .flat_map(|(_, products)| products.iter())
            .find(|p| p.url == url)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::ProductNotFound, "no mock product at this url")
                    .with_operation("MockCatalog::product_details")
                    .with_context("url", url)
            })
    }

    fn source(&self) -> CatalogSource {
        CatalogSource::Mock
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
