//! Shared HTTP plumbing for the REST and Firestore sources.
//!
//! Retry strategy:
//! - HTTP 429 or 5xx → retry with exponential backoff
//! - HTTP 4xx (not 429) → fail immediately
//! - Network error → retry
//!
//! Backoff starts at `[http].retry_base_ms` and doubles per attempt
//! (capped at 32× the base).

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use url::Url;

use crate::config::{HttpConfig, OWNER_PLACEHOLDER};

/// A `GET`-only JSON client with timeout, bearer auth, and retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
    token_env: Option<String>,
}

impl HttpFetcher {
    /// `token_env` overrides `config.token_env` when set.
    pub fn new(config: &HttpConfig, token_env: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("goopss-harness/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
            token_env: token_env
                .map(str::to_string)
                .or_else(|| config.token_env.clone()),
        })
    }

    /// Resolve the bearer token. A configured but unset variable is an error.
    fn token(&self) -> Result<Option<String>> {
        match &self.token_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| anyhow!("{} not set", var)),
            None => Ok(None),
        }
    }

    /// `GET url` and parse the body as JSON, retrying transient failures.
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let token = self.token()?;
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_base * (1u32 << (attempt - 1).min(5));
                tracing::debug!(%url, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.get(url.clone());
            if let Some(ref t) = token {
                request = request.bearer_auth(t);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .with_context(|| format!("invalid JSON from {}", url));
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(%url, %status, attempt, "transient HTTP error");
                        last_err = Some(anyhow!("GET {} failed with {}: {}", url, status, body_text));
                        continue;
                    }

                    bail!("GET {} failed with {}: {}", url, status, body_text);
                }
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "request failed");
                    last_err = Some(anyhow::Error::new(e).context(format!("GET {} failed", url)));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("GET {} failed after retries", url)))
    }
}

/// Substitute `owner` for `{owner}` in a URL template.
///
/// The owner is percent-encoded as a path segment or query value, so ids
/// containing `/`, `?` or spaces cannot change the shape of the URL.
pub fn expand_owner_url(template: &str, owner: &str) -> Result<Url> {
    const MARKER: &str = "__goopss_owner__";

    let mut url = Url::parse(&template.replace(OWNER_PLACEHOLDER, MARKER))
        .with_context(|| format!("invalid URL template: {}", template))?;

    if url.path().contains(MARKER) {
        let segments: Vec<String> = url
            .path_segments()
            .map(|segs| segs.map(|s| s.replace(MARKER, owner)).collect())
            .unwrap_or_default();
        url.path_segments_mut()
            .map_err(|_| anyhow!("URL cannot have path segments: {}", template))?
            .clear()
            .extend(&segments);
    }

    if url.query().is_some_and(|q| q.contains(MARKER)) {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.replace(MARKER, owner)))
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    if url.as_str().contains(MARKER) {
        bail!(
            "{} is only allowed in the path or query of {}",
            OWNER_PLACEHOLDER,
            template
        );
    }

    Ok(url)
}
