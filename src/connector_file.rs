//! JSON file source.
//!
//! Reads records from local JSON files: exports of the Firestore
//! collections, cached marketplace responses, or hand-written fixtures.
//!
//! # Configuration
//!
//! ```toml
//! [sources.listings]
//! kind = "file"
//! path = "data/listings/{owner}.json"
//!
//! [sources.tasks]
//! kind = "file"
//! path = "data/tasks.json"
//! ```
//!
//! A missing per-owner listing file means the shop has no listings yet and
//! yields an empty list. Every other missing or unreadable file is an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use goopss_core::source::{ListingSource, OptimizationSource, Source, TaskSource};
use goopss_core::{MarketplaceListing, OptimizationRecord, TaskRecord};

use crate::config::OWNER_PLACEHOLDER;
use crate::records::decode_payload;

pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path with `{owner}` substituted. Path separators in the owner are
    /// replaced so an owner id cannot escape the configured directory.
    fn owner_path(&self, owner: &str) -> PathBuf {
        let safe: String = owner
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        let safe = if safe == ".." || safe == "." { "_".to_string() } else { safe };
        PathBuf::from(self.path.to_string_lossy().replace(OWNER_PLACEHOLDER, &safe))
    }

    async fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let payload: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        decode_payload(&self.label(), payload)
            .with_context(|| format!("Unexpected JSON shape in {}", path.display()))
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "file"
    }
}

#[async_trait]
impl ListingSource for FileSource {
    async fn fetch_listings(&self, owner: &str) -> Result<Vec<MarketplaceListing>> {
        let path = self.owner_path(owner);
        let per_owner = path != self.path;
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;
        if per_owner && !exists {
            tracing::info!(owner, path = %path.display(), "no listing file for owner");
            return Ok(Vec::new());
        }
        let listings = self.read(&path).await?;
        tracing::debug!(owner, count = listings.len(), path = %path.display(), "read listings");
        Ok(listings)
    }
}

#[async_trait]
impl OptimizationSource for FileSource {
    async fn fetch_optimization_records(&self) -> Result<Vec<OptimizationRecord>> {
        self.read(&self.path).await
    }
}

#[async_trait]
impl TaskSource for FileSource {
    async fn fetch_all_tasks(&self) -> Result<Vec<TaskRecord>> {
        self.read(&self.path).await
    }
}
