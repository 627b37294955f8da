use crate::domain::model::{LookupFailure, LookupResult, ProductInfo};
use crate::domain::ports::ProductCatalog;
use crate::utils::error::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://dummyjson.com/products/{id}";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fields read from a catalog product document; everything else is ignored.
#[derive(Debug, Deserialize)]
struct CatalogProduct {
    title: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    price: Option<f64>,
    rating: Option<f64>,
}

/// The catalog is keyed by number: `P101` is looked up as `101`.
pub fn catalog_key(product_id: &str) -> Option<u64> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap());
    digits
        .find(product_id)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

pub struct HttpProductCatalog {
    client: Client,
    endpoint_template: String,
}

impl HttpProductCatalog {
    pub fn new(endpoint_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint_template: endpoint_template.into(),
        })
    }

    /// Expands `{id}`, or appends the key as the last path segment.
    pub fn endpoint_for(&self, key: u64) -> String {
        if self.endpoint_template.contains("{id}") {
            self.endpoint_template.replace("{id}", &key.to_string())
        } else {
            format!("{}/{}", self.endpoint_template.trim_end_matches('/'), key)
        }
    }

    async fn fetch(&self, endpoint: &str) -> LookupResult {
        let response = self.client.get(endpoint).send().await.map_err(|e| {
            if e.is_timeout() {
                LookupFailure::Timeout
            } else {
                LookupFailure::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        tracing::debug!("📡 {} -> {}", endpoint, status);
        if status == StatusCode::NOT_FOUND {
            return Err(LookupFailure::NotFound);
        }
        if !status.is_success() {
            return Err(LookupFailure::HttpStatus(status.as_u16()));
        }

        let product: CatalogProduct = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LookupFailure::Timeout
            } else {
                LookupFailure::MalformedResponse(e.to_string())
            }
        })?;

        let name = product
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LookupFailure::MalformedResponse("missing product title".to_string()))?;

        Ok(ProductInfo {
            name,
            category: product.category,
            brand: product.brand,
            price: product.price,
            rating: product.rating,
        })
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn lookup(&self, product_id: &str) -> LookupResult {
        let Some(key) = catalog_key(product_id) else {
            return Err(LookupFailure::InvalidProductId);
        };
        let endpoint = self.endpoint_for(key);
        tracing::debug!("📡 Looking up {} at {}", product_id, endpoint);
        self.fetch(&endpoint).await
    }

    /// `P101` and `SKU-101` hit the same endpoint.
    fn memo_key(&self, product_id: &str) -> String {
        catalog_key(product_id)
            .map(|key| key.to_string())
            .unwrap_or_else(|| product_id.to_string())
    }
}
