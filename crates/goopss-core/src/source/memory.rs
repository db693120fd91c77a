//! In-memory data source for tests and embedding.
//!
//! Implements all three source traits over `HashMap`/`Vec` behind
//! `std::sync::RwLock`. Fetches return clones of the stored data.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MarketplaceListing, OptimizationRecord, TaskRecord};

use super::{ListingSource, OptimizationSource, Source, TaskSource};

/// In-memory listings (per owner), optimization records, and tasks.
pub struct InMemorySource {
    listings: RwLock<HashMap<String, Vec<MarketplaceListing>>>,
    optimizations: RwLock<Vec<OptimizationRecord>>,
    tasks: RwLock<Vec<TaskRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            optimizations: RwLock::new(Vec::new()),
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Replace `owner`'s listings.
    pub fn set_listings(&self, owner: &str, listings: Vec<MarketplaceListing>) {
        self.listings
            .write()
            .unwrap()
            .insert(owner.to_string(), listings);
    }

    pub fn push_optimization(&self, record: OptimizationRecord) {
        self.optimizations.write().unwrap().push(record);
    }

    pub fn push_task(&self, task: TaskRecord) {
        self.tasks.write().unwrap().push(task);
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn kind(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl ListingSource for InMemorySource {
    async fn fetch_listings(&self, owner: &str) -> Result<Vec<MarketplaceListing>> {
        Ok(self
            .listings
            .read()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl OptimizationSource for InMemorySource {
    async fn fetch_optimization_records(&self) -> Result<Vec<OptimizationRecord>> {
        Ok(self.optimizations.read().unwrap().clone())
    }
}

#[async_trait]
impl TaskSource for InMemorySource {
    async fn fetch_all_tasks(&self) -> Result<Vec<TaskRecord>> {
        Ok(self.tasks.read().unwrap().clone())
    }
}
