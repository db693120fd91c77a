//! Fetch-then-merge pipelines.
//!
//! These are the only async entry points of the core. Each one fetches from
//! its collaborators, then hands the complete data to the pure reconciler or
//! aggregator. A failed fetch aborts the pipeline before any merge runs.
//!
//! Listings and optimization records are independent, so
//! [`load_listing_view`] fetches them concurrently and merges once both
//! have arrived.

use anyhow::{Context, Result};
use futures_util::future::try_join;
use serde::Serialize;

use crate::aggregate::{aggregate, filter_tasks};
use crate::models::{CategoryCount, DateRange, ReconciledListing};
use crate::reconcile::{orphaned_records, reconcile, ReconcileStats};
use crate::source::{ListingSource, OptimizationSource, Source, TaskSource};

/// Reconciled listings of one owner plus pass statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    pub owner: String,
    pub stats: ReconcileStats,
    pub listings: Vec<ReconciledListing>,
}

/// Category counts of one owner's tasks.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    /// Sum of all category counts.
    pub total: usize,
    pub categories: Vec<CategoryCount>,
}

/// Fetch `owner`'s listings and all optimization records, then reconcile.
pub async fn load_listing_view(
    listings: &dyn ListingSource,
    optimizations: &dyn OptimizationSource,
    owner: &str,
) -> Result<ListingView> {
    let (fetched, records) = try_join(
        async {
            listings
                .fetch_listings(owner)
                .await
                .with_context(|| format!("failed to fetch listings from {}", listings.label()))
        },
        async {
            optimizations
                .fetch_optimization_records()
                .await
                .with_context(|| {
                    format!(
                        "failed to fetch optimization records from {}",
                        optimizations.label()
                    )
                })
        },
    )
    .await?;

    let reconciled = reconcile(&fetched, &records);
    let orphaned = orphaned_records(&fetched, &records).len();
    let stats = ReconcileStats::from_results(&reconciled, orphaned);

    tracing::debug!(
        owner,
        listings = stats.total,
        records = records.len(),
        optimized = stats.optimized,
        orphaned = stats.orphaned_records,
        "reconciled listings"
    );

    Ok(ListingView {
        owner: owner.to_string(),
        stats,
        listings: reconciled,
    })
}

/// Fetch all tasks and aggregate `owner`'s by category.
///
/// With no owner selected nothing is fetched and the view is empty.
pub async fn load_task_view(
    tasks: &dyn TaskSource,
    owner: Option<&str>,
    range: Option<DateRange>,
) -> Result<TaskView> {
    let Some(owner) = owner else {
        return Ok(TaskView {
            owner: None,
            range,
            total: 0,
            categories: Vec::new(),
        });
    };

    let all = tasks
        .fetch_all_tasks()
        .await
        .with_context(|| format!("failed to fetch tasks from {}", tasks.label()))?;

    let categories = aggregate(&all, Some(owner), range.as_ref());
    let total = categories.iter().map(|c| c.count).sum();

    tracing::debug!(
        owner,
        fetched = all.len(),
        owned = filter_tasks(&all, owner, None).count(),
        total,
        "aggregated tasks"
    );

    Ok(TaskView {
        owner: Some(owner.to_string()),
        range,
        total,
        categories,
    })
}
