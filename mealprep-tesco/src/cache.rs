//! File-backed nutrition cache
//!
//! Product pages are slow to fetch and nutrition tables never change, so we
//! persist them to a small JSON document keyed by the product's tpnc. The
//! cache survives restarts and counts hits so the popular entries surface
//! in `stats`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{serialization_error, Result};
use crate::product::NutritionFacts;

const CACHE_VERSION: &str = "1.0";

/// The on-disk document. Versioned so a future format change can migrate
/// instead of silently misreading old files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheDocument {
    cache_version: String,
    last_updated: u64,
    products: HashMap<String, CacheEntry>,
}

impl CacheDocument {
    fn fresh() -> Self {
        CacheDocument {
            cache_version: CACHE_VERSION.to_string(),
            last_updated: current_timestamp(),
            products: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    product_name: String,
    product_url: String,
    nutrition: NutritionFacts,
    cached_at: u64,
    cache_hits: u64,
}

/// Summary of cache contents, serialized directly by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_cached_products: usize,
    pub total_cache_hits: u64,
    pub cache_file_size_kb: f64,
    pub last_updated: u64,
    pub most_popular: Vec<PopularProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularProduct {
    pub name: String,
    pub hits: u64,
}

/// Persistent nutrition store.
///
/// Lookups count as hits and are flushed back to disk on a best-effort
/// basis; a failed flush loses a hit count, never data.
#[derive(Debug)]
pub struct NutritionCache {
    path: PathBuf,
    doc: CacheDocument,
}

impl NutritionCache {
    /// Open the cache at `path`, creating an empty one if the file does not
    /// exist. A corrupted file is logged and replaced rather than failing
    /// the whole catalog.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<CacheDocument>(&raw) {
                Ok(doc) if doc.cache_version == CACHE_VERSION => doc,
                Ok(doc) => {
                    tracing::warn!(path = %path.display(), version = %doc.cache_version, "unsupported cache version, starting fresh");
                    CacheDocument::fresh()
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cache file corrupted, starting fresh");
                    CacheDocument::fresh()
                }
            },
            Err(_) => CacheDocument::fresh(),
        };

        NutritionCache { path, doc }
    }

    /// Look up nutrition for a product URL, bumping its hit count on success.
    pub fn get(&mut self, product_url: &str) -> Option<NutritionFacts> {
        self.get_entry(product_url).map(|(_, facts)| facts)
    }

    /// Like [`get`](Self::get) but also returns the cached product name, so
    /// a hit can stand in for a full product fetch.
    pub fn get_entry(&mut self, product_url: &str) -> Option<(String, NutritionFacts)> {
        let key = product_key(product_url);
        let entry = self.doc.products.get_mut(&key)?;
        entry.cache_hits += 1;
        let found = (entry.product_name.clone(), entry.nutrition.clone());

        // Hit counts are statistics, not data. Don't fail a lookup over them.
        if let Err(err) = self.save() {
            tracing::debug!(error = %err, "failed to persist cache hit count");
        }

        Some(found)
    }

    /// Store nutrition for a product. Empty facts are not worth a disk write.
    pub fn insert(&mut self, product_name: &str, product_url: &str, nutrition: NutritionFacts) -> Result<()> {
        if nutrition.is_empty() {
            return Ok(());
        }

        let key = product_key(product_url);
        self.doc.products.insert(
            key,
            CacheEntry {
                product_name: product_name.to_string(),
                product_url: product_url.to_string(),
                nutrition,
                cached_at: current_timestamp(),
                cache_hits: 0,
            },
        );

        self.save()
    }

    pub fn len(&self) -> usize {
        self.doc.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.products.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut popular: Vec<PopularProduct> = self
            .doc
            .products
            .values()
            .map(|e| PopularProduct {
                name: e.product_name.clone(),
                hits: e.cache_hits,
            })
            .collect();
        popular.sort_by(|a, b| b.hits.cmp(&a.hits));
        popular.truncate(5);

        let size_kb = fs::metadata(&self.path)
            .map(|m| (m.len() as f64 / 1024.0 * 10.0).round() / 10.0)
            .unwrap_or(0.0);

        CacheStats {
            total_cached_products: self.doc.products.len(),
            total_cache_hits: self.doc.products.values().map(|e| e.cache_hits).sum(),
            cache_file_size_kb: size_kb,
            last_updated: self.doc.last_updated,
            most_popular: popular,
        }
    }

    /// Drop every entry and persist the empty document.
    pub fn clear(&mut self) -> Result<()> {
        self.doc.products.clear();
        self.save()
    }

    /// Export every entry as CSV. Written by hand so the output stays a
    /// plain spreadsheet-friendly table with a fixed column order.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let mut out = String::new();
        out.push_str("Product ID,Product Name,Product URL,Serving Size,Energy,Protein,Carbs,Fat,Salt,Cache Hits,Cached At\n");

        let mut keys: Vec<&String> = self.doc.products.keys().collect();
        keys.sort();

        for key in &keys {
            let entry = &self.doc.products[*key];
            let n = &entry.nutrition;
            let row = [
                key.as_str(),
                entry.product_name.as_str(),
                entry.product_url.as_str(),
                n.serving_size.as_deref().unwrap_or(""),
                n.energy.as_deref().unwrap_or(""),
                n.protein.as_deref().unwrap_or(""),
                n.carbs.as_deref().unwrap_or(""),
                n.fat.as_deref().unwrap_or(""),
                n.salt.as_deref().unwrap_or(""),
            ];
            for field in row {
                out.push_str(&csv_escape(field));
                out.push(',');
            }
            out.push_str(&entry.cache_hits.to_string());
            out.push(',');
            out.push_str(&entry.cached_at.to_string());
            out.push('\n');
        }

        fs::write(path, out)?;
        Ok(keys.len())
    }

    fn save(&mut self) -> Result<()> {
        self.doc.last_updated = current_timestamp();
        let raw = serde_json::to_string_pretty(&self.doc).map_err(|e| {
            serialization_error("failed to serialize nutrition cache")
                .with_operation("NutritionCache::save")
                .set_source(e)
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Cache keys are the tpnc segment of the product URL, so the same product
/// found via different query strings shares one entry. URLs without the
/// segment are sanitized into a filesystem-safe key.
pub(crate) fn product_key(product_url: &str) -> String {
    let tail = product_url
        .split("/products/")
        .nth(1)
        .map(|t| t.split(['?', '#']).next().unwrap_or(t));

    match tail {
        Some(tpnc) if !tpnc.is_empty() => tpnc.to_string(),
        _ => product_url
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect(),
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
