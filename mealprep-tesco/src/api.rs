//! Hosted product API backend
//!
//! Drives a third-party scraping actor: start a run with the retailer
//! search URL as input, poll until the run finishes, then read products
//! from the run's default dataset. Slower than hitting the site directly
//! but immune to bot walls.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::cache::product_key;
use crate::catalog::{CatalogBackend, CatalogConfig};
use crate::error::{config_invalid, network_failed, rate_limited, Result};
use crate::extract::brand_from_title;
use crate::product::{Availability, CatalogSource, NutritionFacts, Product, DEFAULT_IMAGE_URL};

const API_BASE_URL: &str = "https://api.apify.com/v2";
const ACTOR_ID: &str = "jupri~tesco-grocery";
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_TIMEOUT: Duration = Duration::from_secs(120);

pub struct ApiCatalog {
    client: reqwest::Client,
    token: String,
    base_url: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    data: RunData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunData {
    id: String,
    status: String,
    #[serde(default)]
    default_dataset_id: Option<String>,
}

/// One dataset row as the actor emits it. Field names follow the actor's
/// output schema, with aliases for the variants seen in the wild.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetItem {
    title: Option<String>,
    price: Option<f64>,
    url: Option<String>,
    #[serde(alias = "image")]
    image_url: Option<String>,
    brand: Option<String>,
    unit_price: Option<String>,
    promotion: Option<String>,
    #[serde(alias = "inStock")]
    available: Option<bool>,
    #[serde(default)]
    nutrition: Option<NutritionFacts>,
}

impl ApiCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let token = config.api_token.clone().ok_or_else(|| {
            config_invalid("hosted API backend needs an API token")
                .with_operation("ApiCatalog::new")
                .with_context("env", "APIFY_API_TOKEN")
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                network_failed("failed to build HTTP client")
                    .with_operation("ApiCatalog::new")
                    .set_source(e)
            })?;

        Ok(ApiCatalog {
            client,
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_base: API_BASE_URL.to_string(),
        })
    }

    /// Start an actor run over the given retailer URLs. The API answers
    /// 201 with the run record when the run was accepted.
    async fn start_run(&self, input_urls: &[String], limit: usize) -> Result<String> {
        let url = format!("{}/acts/{}/runs", self.api_base, ACTOR_ID);
        let input = json!({ "query": input_urls, "limit": limit });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await
            .map_err(|e| {
                network_failed("failed to start actor run")
                    .with_operation("ApiCatalog::start_run")
                    .set_source(e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(&url));
        }
        if status != reqwest::StatusCode::CREATED {
            return Err(network_failed(format!("actor run not created: {}", status))
                .with_operation("ApiCatalog::start_run")
                .permanent());
        }

        let run: RunResponse = response.json().await.map_err(|e| {
            network_failed("malformed run response")
                .with_operation("ApiCatalog::start_run")
                .set_source(e)
        })?;

        tracing::info!(run_id = %run.data.id, "actor run started");
        Ok(run.data.id)
    }

    /// Poll the run until it reaches a terminal state, returning the
    /// dataset id on success.
    async fn wait_for_run(&self, run_id: &str) -> Result<String> {
        let url = format!("{}/actor-runs/{}", self.api_base, run_id);
        let deadline = tokio::time::Instant::now() + POLL_TIMEOUT;

        loop {
            let run: RunResponse = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| {
                    network_failed("failed to poll actor run")
                        .with_operation("ApiCatalog::wait_for_run")
                        .set_source(e)
                })?
                .json()
                .await
                .map_err(|e| {
                    network_failed("malformed run response")
                        .with_operation("ApiCatalog::wait_for_run")
                        .set_source(e)
                })?;

            match run.data.status.as_str() {
                "SUCCEEDED" => {
                    return run.data.default_dataset_id.ok_or_else(|| {
                        network_failed("actor run succeeded without a dataset")
                            .with_operation("ApiCatalog::wait_for_run")
                            .permanent()
                    });
                }
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(network_failed(format!(
                        "actor run {} ended as {}",
                        run_id, run.data.status
                    ))
                    .with_operation("ApiCatalog::wait_for_run")
                    .permanent());
                }
                other => {
                    tracing::debug!(run_id = run_id, status = other, "actor run in progress");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(network_failed(format!(
                    "actor run {} did not finish within {}s",
                    run_id,
                    POLL_TIMEOUT.as_secs()
                ))
                .with_operation("ApiCatalog::wait_for_run"));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<DatasetItem>> {
        let url = format!("{}/datasets/{}/items", self.api_base, dataset_id);

        let values: Vec<serde_json::Value> = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                network_failed("failed to fetch dataset items")
                    .with_operation("ApiCatalog::dataset_items")
                    .set_source(e)
            })?
            .json()
            .await
            .map_err(|e| {
                network_failed("malformed dataset response")
                    .with_operation("ApiCatalog::dataset_items")
                    .set_source(e)
            })?;

        // Individual rows can deviate from the schema; drop those rather
        // than failing the whole dataset.
        let items = values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<DatasetItem>(v) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed dataset item");
                    None
                }
            })
            .collect();

        Ok(items)
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/groceries/en-GB/search?query={}",
            self.base_url,
            query.replace(' ', "%20")
        )
    }

    async fn run_and_collect(&self, input_urls: &[String], limit: usize) -> Result<Vec<Product>> {
        let run_id = self.start_run(input_urls, limit).await?;
        let dataset_id = self.wait_for_run(&run_id).await?;
        let items = self.dataset_items(&dataset_id).await?;

        let mut products: Vec<Product> = items.into_iter().filter_map(item_into_product).collect();
        products.truncate(limit);
        Ok(products)
    }
}

fn item_into_product(item: DatasetItem) -> Option<Product> {
    let name = item.title?;
    let url = item.url.unwrap_or_default();

    Some(Product {
        id: if url.is_empty() { "unknown".to_string() } else { product_key(&url) },
        brand: item.brand.unwrap_or_else(|| brand_from_title(&name)),
        price: item.price,
        display_price: item.price.map(Product::format_price),
        unit_price: item.unit_price,
        promotion: item.promotion,
        image_url: item.image_url.or_else(|| Some(DEFAULT_IMAGE_URL.to_string())),
        availability: match item.available {
            Some(true) => Availability::Available,
            Some(false) => Availability::OutOfStock,
            None => Availability::Unknown,
        },
        nutrition: item.nutrition,
        source: CatalogSource::Api,
        name,
        url,
    })
}

#[async_trait]
impl CatalogBackend for ApiCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        tracing::info!(query = query, "searching via hosted API");
        let products = self
            .run_and_collect(&[self.search_url(query)], limit)
            .await?;
        tracing::info!(query = query, found = products.len(), "hosted API search complete");
        Ok(products)
    }

    async fn product_details(&self, url: &str) -> Result<Product> {
        let mut products = self.run_and_collect(&[url.to_string()], 1).await?;
        products.pop().ok_or_else(|| {
            crate::error::product_not_found(url).with_operation("ApiCatalog::product_details")
        })
    }

    fn source(&self) -> CatalogSource {
        CatalogSource::Api
    }
}
