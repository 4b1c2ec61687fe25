//! Product and nutrition data model
//!
//! Products come from three places (live site, hosted API, mock catalog) and
//! all of them normalize into [`Product`]. Nutrition values keep the
//! retailer's display form (`"106kcal"`, `"23.1g"`) with numeric accessors
//! for the planning math.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder image the retailer serves when a product has no photo
pub(crate) const DEFAULT_IMAGE_URL: &str =
    "https://digitalcontent.api.tesco.com/v2/media/ghs/default-product.jpeg";

/// Which backend produced a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Live search page extraction
    Web,
    /// Hosted product-scraper API
    Api,
    /// Built-in offline catalog
    Mock,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CatalogSource::Web => "web",
            CatalogSource::Api => "api",
            CatalogSource::Mock => "mock",
        };
        write!(f, "{}", s)
    }
}

/// Stock status as far as the search page tells us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    OutOfStock,
    Unknown,
}

/// A single catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Retailer product id (numeric where known, synthesized otherwise)
    pub id: String,
    pub name: String,
    pub brand: String,
    /// Product page URL
    pub url: String,
    /// Price in pounds, when extraction found one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Price in display form, e.g. `£4.50`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_price: Option<String>,
    /// Per-weight price derived from the pack size, e.g. `£0.70/100g`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    pub source: CatalogSource,
}

impl Product {
    /// Build the product page URL from a tpnc (the retailer's numeric id)
    pub fn product_page_url(base_url: &str, tpnc: &str) -> String {
        format!("{}/groceries/en-GB/products/{}", base_url, tpnc)
    }

    /// Format a pound amount the way the site displays it
    pub fn format_price(pounds: f64) -> String {
        format!("£{:.2}", pounds)
    }
}

/// Per-100g (or per-serving) nutrition in the retailer's display form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    /// e.g. `106kcal`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    /// e.g. `23.1g`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl NutritionFacts {
    /// Standard per-100g facts, the shape the reference table produces
    pub fn per_100g(
        energy: impl Into<String>,
        protein: impl Into<String>,
        carbs: impl Into<String>,
        fat: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            serving_size: Some("100g".into()),
            energy: Some(energy.into()),
            protein: Some(protein.into()),
            carbs: Some(carbs.into()),
            fat: Some(fat.into()),
            salt: Some(salt.into()),
        }
    }

    /// True when no nutrient carries a value. A serving size alone does not
    /// count as data.
    pub fn is_empty(&self) -> bool {
        self.energy.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.salt.is_none()
    }

    /// Parse the leading number out of a display amount like `23.1g` or `106kcal`
    pub fn parse_amount(value: &str) -> Option<f64> {
        let digits: String = value
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse().ok()
    }

    pub fn energy_kcal(&self) -> Option<f64> {
        self.energy.as_deref().and_then(Self::parse_amount)
    }

    pub fn protein_g(&self) -> Option<f64> {
        self.protein.as_deref().and_then(Self::parse_amount)
    }

    pub fn carbs_g(&self) -> Option<f64> {
        self.carbs.as_deref().and_then(Self::parse_amount)
    }

    pub fn fat_g(&self) -> Option<f64> {
        self.fat.as_deref().and_then(Self::parse_amount)
    }

    pub fn salt_g(&self) -> Option<f64> {
        self.salt.as_deref().and_then(Self::parse_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_page_url() {
        let url = Product::product_page_url("https://www.tesco.com", "254892116");
        assert_eq!(url, "https://www.tesco.com/groceries/en-GB/products/254892116");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(Product::format_price(4.5), "£4.50");
        assert_eq!(Product::format_price(2.0), "£2.00");
        assert_eq!(Product::format_price(0.7), "£0.70");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(NutritionFacts::parse_amount("23.1g"), Some(23.1));
        assert_eq!(NutritionFacts::parse_amount("106kcal"), Some(106.0));
        assert_eq!(NutritionFacts::parse_amount("0g"), Some(0.0));
        assert_eq!(NutritionFacts::parse_amount("n/a"), None);
    }

    #[test]
    fn test_numeric_accessors() {
        let facts = NutritionFacts::per_100g("106kcal", "23.1g", "0g", "1.9g", "0.22g");
        assert_eq!(facts.energy_kcal(), Some(106.0));
        assert_eq!(facts.protein_g(), Some(23.1));
        assert_eq!(facts.carbs_g(), Some(0.0));
        assert_eq!(facts.fat_g(), Some(1.9));
        assert_eq!(facts.salt_g(), Some(0.22));
        assert!(!facts.is_empty());
        assert!(NutritionFacts::default().is_empty());
    }

    #[test]
    fn test_product_serde_round_trip() {
        let product = Product {
            id: "254892116".into(),
            name: "Tesco British Chicken Breast Fillets 640G".into(),
            brand: "Tesco".into(),
            url: "https://www.tesco.com/groceries/en-GB/products/254892116".into(),
            price: Some(4.5),
            display_price: Some("£4.50".into()),
            unit_price: Some("£0.70/100g".into()),
            promotion: None,
            image_url: None,
            availability: Availability::Available,
            nutrition: Some(NutritionFacts::per_100g("106kcal", "23.1g", "0g", "1.9g", "0.22g")),
            source: CatalogSource::Mock,
        };

        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("\"source\":\"mock\""));
        assert!(json.contains("\"availability\":\"available\""));

        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, product.name);
        assert_eq!(back.price, Some(4.5));
    }
}
