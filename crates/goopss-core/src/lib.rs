//! # Goopss Core
//!
//! Shared, I/O-free logic for Goopss Harness: data models, the listing
//! reconciler, the task aggregator, data source traits, and the
//! fetch-then-merge pipelines built on them.
//!
//! This crate contains no tokio, filesystem, or HTTP dependencies.
//! Concrete sources (JSON files, REST backends, Firestore) live in the
//! `goopss-harness` crate.

pub mod aggregate;
pub mod models;
pub mod pipeline;
pub mod reconcile;
pub mod source;

pub use aggregate::aggregate;
pub use models::{
    CategoryCount, DateRange, MarketplaceListing, OptimizationRecord, ReconciledListing,
    TaskRecord,
};
pub use pipeline::{load_listing_view, load_task_view, ListingView, TaskView};
pub use reconcile::{reconcile, ReconcileStats};
