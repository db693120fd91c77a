//! Data source abstraction.
//!
//! The reconciler and aggregator are pure; everything they consume comes
//! from one of three collaborator traits:
//!
//! | Trait | Operation | Scope |
//! |-------|-----------|-------|
//! | [`ListingSource`] | [`fetch_listings`](ListingSource::fetch_listings) | one owner's shop |
//! | [`OptimizationSource`] | [`fetch_optimization_records`](OptimizationSource::fetch_optimization_records) | all records (unscoped) |
//! | [`TaskSource`] | [`fetch_all_tasks`](TaskSource::fetch_all_tasks) | all tasks (unscoped) |
//!
//! Implementations own their transport concerns (timeouts, retries,
//! pagination) and report failures as errors; callers never see partial
//! results from a failed fetch.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MarketplaceListing, OptimizationRecord, TaskRecord};

/// Identity shared by every data source, used in logs and error context.
pub trait Source: Send + Sync {
    /// Instance name (e.g. `"listings"`, `"tasks"`).
    fn name(&self) -> &str;

    /// Transport kind (e.g. `"file"`, `"http"`, `"firestore"`, `"memory"`).
    fn kind(&self) -> &str {
        "custom"
    }

    /// `"{kind}:{name}"`.
    fn label(&self) -> String {
        format!("{}:{}", self.kind(), self.name())
    }
}

/// Fetches the marketplace listings of one owner's shop.
#[async_trait]
pub trait ListingSource: Source {
    async fn fetch_listings(&self, owner: &str) -> Result<Vec<MarketplaceListing>>;
}

/// Fetches every stored optimization record.
#[async_trait]
pub trait OptimizationSource: Source {
    async fn fetch_optimization_records(&self) -> Result<Vec<OptimizationRecord>>;
}

/// Fetches every task record.
#[async_trait]
pub trait TaskSource: Source {
    async fn fetch_all_tasks(&self) -> Result<Vec<TaskRecord>>;
}
