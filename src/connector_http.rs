//! REST backend source.
//!
//! Fetches records with a single `GET` against the service backend, e.g. the
//! endpoint that proxies the marketplace's listing API for a shop.
//!
//! # Configuration
//!
//! ```toml
//! [sources.listings]
//! kind = "http"
//! url = "https://api.example.com/etsy/shops/{owner}/listings"
//! # token_env = "GOOPSS_API_TOKEN"
//! ```
//!
//! Responses may be a bare array or an envelope (see [`crate::records`]).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use goopss_core::source::{ListingSource, OptimizationSource, Source, TaskSource};
use goopss_core::{MarketplaceListing, OptimizationRecord, TaskRecord};

use crate::config::{HttpConfig, HttpSourceConfig};
use crate::http::{expand_owner_url, HttpFetcher};
use crate::records::decode_payload;

pub struct HttpSource {
    name: String,
    url_template: String,
    fetcher: HttpFetcher,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, config: &HttpSourceConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            url_template: config.url.clone(),
            fetcher: HttpFetcher::new(http, config.token_env.as_deref())?,
        })
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<Vec<T>> {
        let payload = self.fetcher.get_json(url).await?;
        decode_payload(&self.label(), payload)
            .with_context(|| format!("Unexpected JSON shape from {}", url))
    }

    fn unscoped_url(&self) -> Result<Url> {
        Url::parse(&self.url_template).with_context(|| format!("invalid URL: {}", self.url_template))
    }
}

impl Source for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "http"
    }
}

#[async_trait]
impl ListingSource for HttpSource {
    async fn fetch_listings(&self, owner: &str) -> Result<Vec<MarketplaceListing>> {
        let url = expand_owner_url(&self.url_template, owner)?;
        let listings = self.fetch(&url).await?;
        tracing::debug!(owner, count = listings.len(), %url, "fetched listings");
        Ok(listings)
    }
}

#[async_trait]
impl OptimizationSource for HttpSource {
    async fn fetch_optimization_records(&self) -> Result<Vec<OptimizationRecord>> {
        self.fetch(&self.unscoped_url()?).await
    }
}

#[async_trait]
impl TaskSource for HttpSource {
    async fn fetch_all_tasks(&self) -> Result<Vec<TaskRecord>> {
        self.fetch(&self.unscoped_url()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn http_config() -> HttpConfig {
        HttpConfig {
            timeout_secs: 5,
            max_retries: 0,
            retry_base_ms: 1,
            token_env: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_listings_for_owner() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/shops/shop-1/listings");
                then.status(200).json_body(json!({
                    "count": 2,
                    "results": [
                        {"listing_id": 1, "title": "A", "tags": ["x"]},
                        {"listing_id": 2, "title": "B", "price": {"amount": 1200}}
                    ]
                }));
            })
            .await;

        let cfg = HttpSourceConfig {
            url: server.url("/shops/{owner}/listings"),
            token_env: None,
        };
        let src = HttpSource::new("listings", &cfg, &http_config()).unwrap();
        let listings = src.fetch_listings("shop-1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].tags, vec!["x"]);
        assert_eq!(listings[1].extra["price"]["amount"], 1200);
    }

    #[tokio::test]
    async fn test_fetch_tasks_unscoped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks");
                then.status(200).json_body(json!([
                    {"customerId": "c1", "category": "SEO", "dateCompleted": "2024-01-05"}
                ]));
            })
            .await;

        let cfg = HttpSourceConfig {
            url: server.url("/tasks"),
            token_env: None,
        };
        let src = HttpSource::new("tasks", &cfg, &http_config()).unwrap();
        let tasks = src.fetch_all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].customer_id, "c1");
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/optimizations");
                then.status(404).body("no such collection");
            })
            .await;

        let cfg = HttpSourceConfig {
            url: server.url("/optimizations"),
            token_env: None,
        };
        let src = HttpSource::new("optimizations", &cfg, &http_config()).unwrap();
        let err = src.fetch_optimization_records().await.unwrap_err();
        assert!(err.to_string().contains("404"), "got: {}", err);
    }
}
