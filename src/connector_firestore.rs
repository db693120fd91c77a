//! Firestore source.
//!
//! Lists a collection through the Firestore REST API and decodes Firestore's
//! typed field values into plain JSON before handing them to the record
//! decoder. Used for the optimization-record and task collections.
//!
//! # Configuration
//!
//! ```toml
//! [sources.optimizations]
//! kind = "firestore"
//! project_id = "goopss-prod"
//! collection = "optimizedListings"
//! # base_url = "http://localhost:8080"   # emulator
//! # token_env = "GOOGLE_OAUTH_ACCESS_TOKEN"
//! ```
//!
//! # Pagination
//!
//! `documents:list` returns at most `pageSize` documents per call plus a
//! `nextPageToken`; pages are requested until the token is absent.
//!
//! # Value Decoding
//!
//! | Firestore value | JSON |
//! |-----------------|------|
//! | `stringValue`, `timestampValue`, `referenceValue`, `bytesValue` | string |
//! | `integerValue` (a decimal string on the wire) | number |
//! | `doubleValue` | number |
//! | `booleanValue` | bool |
//! | `nullValue` | null |
//! | `arrayValue` | array |
//! | `mapValue` | object |
//! | `geoPointValue` | `{latitude, longitude}` |
//!
//! The document id (last segment of `name`) is stored as `id` unless the
//! document already has an `id` field.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use goopss_core::source::{OptimizationSource, Source, TaskSource};
use goopss_core::{OptimizationRecord, TaskRecord};

use crate::config::{FirestoreSourceConfig, HttpConfig};
use crate::http::HttpFetcher;
use crate::records::decode_records;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

pub struct FirestoreSource {
    name: String,
    config: FirestoreSourceConfig,
    fetcher: HttpFetcher,
}

impl FirestoreSource {
    pub fn new(name: impl Into<String>, config: &FirestoreSourceConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            config: config.clone(),
            fetcher: HttpFetcher::new(http, config.token_env.as_deref())?,
        })
    }

    /// `{base}/v1/projects/{project}/databases/{database}/documents/{collection}`.
    pub fn collection_url(&self) -> Result<Url> {
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut url = Url::parse(base).with_context(|| format!("invalid base_url: {}", base))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("base_url cannot have path segments: {}", base))?;
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.config.project_id.as_str(),
                "databases",
                self.config.database.as_str(),
                "documents",
            ]);
            segments.extend(self.config.collection.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    /// Every document of the collection, decoded to plain JSON.
    async fn list_documents(&self) -> Result<Vec<Value>> {
        let base = self.collection_url()?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &self.config.page_size.to_string());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page = self.fetcher.get_json(&url).await?;
            pages += 1;

            if let Some(docs) = page.get("documents") {
                let docs = docs
                    .as_array()
                    .ok_or_else(|| anyhow!("'documents' is not an array in response from {}", url))?;
                for doc in docs {
                    documents.push(decode_document(doc)?);
                }
            }

            match page.get("nextPageToken").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => {
                    if page_token.as_deref() == Some(next) {
                        bail!("Firestore returned the same page token twice for {}", base);
                    }
                    page_token = Some(next.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(
            collection = %self.config.collection,
            documents = documents.len(),
            pages,
            "listed Firestore collection"
        );
        Ok(documents)
    }

    async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let docs = self.list_documents().await?;
        Ok(decode_records(&self.label(), docs))
    }
}

impl Source for FirestoreSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "firestore"
    }
}

#[async_trait]
impl OptimizationSource for FirestoreSource {
    async fn fetch_optimization_records(&self) -> Result<Vec<OptimizationRecord>> {
        self.fetch().await
    }
}

#[async_trait]
impl TaskSource for FirestoreSource {
    async fn fetch_all_tasks(&self) -> Result<Vec<TaskRecord>> {
        self.fetch().await
    }
}

/// Decode one REST document (`{name, fields, createTime, updateTime}`).
pub fn decode_document(doc: &Value) -> Result<Value> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Firestore document without a name"))?;

    let mut out = match doc.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields),
        Some(_) => bail!("document {}: 'fields' is not an object", name),
        None => Map::new(),
    };

    if !out.contains_key("id") {
        let id = name.rsplit('/').next().unwrap_or(name);
        out.insert("id".to_string(), Value::String(id.to_string()));
    }

    Ok(Value::Object(out))
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Decode one typed Firestore value. Unknown shapes become `null`.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| inner.clone()),
            other => other.clone(),
        },
        "doubleValue" | "booleanValue" => inner.clone(),
        "nullValue" => Value::Null,
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}
