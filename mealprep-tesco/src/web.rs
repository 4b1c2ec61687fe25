//! Live retailer website backend
//!
//! Fetches the mobile search page and reads products out of the embedded
//! GraphQL cache. The mobile user agent gets a lighter page that is walled
//! off less aggressively than the desktop one, but blocks still happen;
//! those surface as retryable errors so the facade can fall back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;

use crate::catalog::{CatalogBackend, CatalogConfig};
use crate::error::{extraction_failed, network_failed, rate_limited, search_blocked, Result};
use crate::extract;
use crate::product::{CatalogSource, Product};

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

pub struct WebCatalog {
    client: reqwest::Client,
    base_url: String,
    politeness_delay: Duration,
}

impl WebCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                network_failed("failed to build HTTP client")
                    .with_operation("WebCatalog::new")
                    .set_source(e)
            })?;

        Ok(WebCatalog {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            politeness_delay: config.politeness_delay(),
        })
    }

    /// GET a page with the politeness delay in front, mapping HTTP failures
    /// onto catalog errors.
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        tokio::time::sleep(self.politeness_delay).await;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                network_failed(format!("request to {} failed", url))
                    .with_operation("WebCatalog::fetch")
                    .set_source(e)
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(url));
        }
        if !status.is_success() {
            return Err(network_failed(format!("{} returned {}", url, status))
                .with_operation("WebCatalog::fetch"));
        }

        response.text().await.map_err(|e| {
            network_failed("failed to read response body")
                .with_operation("WebCatalog::fetch")
                .set_source(e)
        })
    }
}

#[async_trait]
impl CatalogBackend for WebCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        let url = format!("{}/groceries/en-GB/search", self.base_url);
        tracing::info!(query = query, "searching retailer site");

        let html = self.fetch(&url, &[("query", query)]).await?;
        if extract::looks_blocked(&html) {
            tracing::warn!(bytes = html.len(), "search page looks blocked");
            return Err(search_blocked(&url));
        }

        let mut products = extract::extract_products(&html, &self.base_url);
        extract::enrich_prices(&mut products, &html);
        products.truncate(limit);

        tracing::info!(query = query, found = products.len(), "search complete");
        Ok(products)
    }

    async fn product_details(&self, url: &str) -> Result<Product> {
        let html = self.fetch(url, &[]).await?;
        if extract::looks_blocked(&html) {
            return Err(search_blocked(url));
        }

        let mut products = extract::extract_products(&html, &self.base_url);
        extract::enrich_prices(&mut products, &html);

        let mut product = products.into_iter().next().ok_or_else(|| {
            extraction_failed("no product data found in page").with_context("url", url)
        })?;

        // The page's own nutrition table beats the reference values the
        // extractor attaches by category.
        if let Some(facts) = extract::parse_nutrition(&html) {
            product.nutrition = Some(facts);
        }
        product.url = url.to_string();

        Ok(product)
    }

    fn source(&self) -> CatalogSource {
        CatalogSource::Web
    }
}
