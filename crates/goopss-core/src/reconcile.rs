//! Listing reconciliation: join marketplace listings with optimization records.
//!
//! Every marketplace listing yields exactly one [`ReconciledListing`], in
//! input order. Optimization records are indexed by `listing_id` once, with
//! the first record for a given listing winning; records pointing at
//! listings that were not fetched are ignored.
//!
//! # Field Derivation
//!
//! | Field | With match | Without match |
//! |-------|------------|---------------|
//! | `isOptimized` | `true` | `false` |
//! | `id` | record id | unset |
//! | `optimizedTitle` / `optimizedDescription` | record value or `""` | `""` |
//! | `optimizedTags` | record value or `[]` | `[]` |
//! | `optimizationStatus` | record value or `false` | `false` |
//! | `originalTitle` / `originalDescription` / `originalTags` | record snapshot, verbatim | unset |

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{MarketplaceListing, OptimizationRecord, ReconciledListing};

/// Optimization records keyed by `listing_id`, first occurrence wins.
pub struct OptimizationIndex<'a> {
    by_listing: HashMap<i64, &'a OptimizationRecord>,
}

impl<'a> OptimizationIndex<'a> {
    pub fn build(records: &'a [OptimizationRecord]) -> Self {
        let mut by_listing = HashMap::with_capacity(records.len());
        for record in records {
            by_listing.entry(record.listing_id).or_insert(record);
        }
        Self { by_listing }
    }

    pub fn get(&self, listing_id: i64) -> Option<&'a OptimizationRecord> {
        self.by_listing.get(&listing_id).copied()
    }

    /// Number of distinct listing ids covered.
    pub fn len(&self) -> usize {
        self.by_listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_listing.is_empty()
    }
}

/// Join each listing with its optimization record.
///
/// Output has the same length and order as `listings`. Never fails.
pub fn reconcile(
    listings: &[MarketplaceListing],
    optimizations: &[OptimizationRecord],
) -> Vec<ReconciledListing> {
    let index = OptimizationIndex::build(optimizations);
    listings
        .iter()
        .map(|listing| reconcile_one(listing, index.get(listing.listing_id)))
        .collect()
}

/// Build the reconciled record for a single listing and its (optional) match.
pub fn reconcile_one(
    listing: &MarketplaceListing,
    record: Option<&OptimizationRecord>,
) -> ReconciledListing {
    match record {
        Some(rec) => ReconciledListing {
            listing: listing.clone(),
            id: Some(rec.id.clone()),
            is_optimized: true,
            optimized_title: rec.optimized_title.clone().unwrap_or_default(),
            optimized_description: rec.optimized_description.clone().unwrap_or_default(),
            optimized_tags: rec.optimized_tags.clone().unwrap_or_default(),
            optimization_status: rec.optimization_status.unwrap_or(false),
            original_title: rec.title.clone(),
            original_description: rec.description.clone(),
            original_tags: rec.tags.clone(),
        }
        .without_shadowed_extra(),
        None => ReconciledListing {
            listing: listing.clone(),
            id: None,
            is_optimized: false,
            optimized_title: String::new(),
            optimized_description: String::new(),
            optimized_tags: Vec::new(),
            optimization_status: false,
            original_title: None,
            original_description: None,
            original_tags: None,
        }
        .without_shadowed_extra(),
    }
}

/// Optimization records whose `listing_id` matches none of `listings`.
pub fn orphaned_records<'a>(
    listings: &[MarketplaceListing],
    optimizations: &'a [OptimizationRecord],
) -> Vec<&'a OptimizationRecord> {
    let known: HashSet<i64> = listings.iter().map(|l| l.listing_id).collect();
    optimizations
        .iter()
        .filter(|r| !known.contains(&r.listing_id))
        .collect()
}

/// Counts describing one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Listings reconciled (equals the number of fetched listings).
    pub total: usize,
    /// Listings with a matching optimization record.
    pub optimized: usize,
    /// Matched listings whose optimization is marked complete.
    pub completed: usize,
    /// Optimization records that matched no fetched listing.
    pub orphaned_records: usize,
}

impl ReconcileStats {
    pub fn from_results(reconciled: &[ReconciledListing], orphaned_records: usize) -> Self {
        Self {
            total: reconciled.len(),
            optimized: reconciled.iter().filter(|r| r.is_optimized).count(),
            completed: reconciled
                .iter()
                .filter(|r| r.is_optimized && r.optimization_status)
                .count(),
            orphaned_records,
        }
    }
}
