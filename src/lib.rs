//! # Goopss Harness
//!
//! Listing-optimization reconciliation and task summaries for the Goopss
//! seller service.
//!
//! A shop's marketplace listings are joined with the optimization records
//! produced for them, and a customer's completed tasks are counted per
//! category. Data comes from JSON files, REST backends, or Firestore; the
//! results are served through a CLI and a read-only HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────┐   ┌────────────────┐
//! │     Sources      │──▶│   Pipelines   │──▶│  Reconciler /   │
//! │ File/HTTP/Fstore │   │ fetch, merge │   │   Aggregator    │
//! └──────────────────┘   └──────┬───────┘   └────────────────┘
//!                               │
//!                     ┌─────────┴─────────┐
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │ (goopss) │       │   API    │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! goopss sources                           # check configuration
//! goopss listings shop-123                 # reconciled listings
//! goopss tasks c1 --since 2024-01-01 --until 2024-02-01
//! goopss serve                             # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | Source construction and status |
//! | [`connector_file`] | JSON file source |
//! | [`connector_http`] | REST source |
//! | [`connector_firestore`] | Firestore REST source |
//! | [`http`] | Shared HTTP client with retries |
//! | [`records`] | Payload envelopes and record decoding |
//! | [`listings`] | Reconciled listing view |
//! | [`tasks`] | Task category summary |
//! | [`server`] | HTTP API |
//!
//! The pure logic (models, reconciler, aggregator, source traits) lives in
//! [`goopss_core`] and is re-exported here as [`core`].

pub mod config;
pub mod connector_file;
pub mod connector_firestore;
pub mod connector_http;
pub mod http;
pub mod listings;
pub mod records;
pub mod server;
pub mod sources;
pub mod tasks;

pub use goopss_core as core;
