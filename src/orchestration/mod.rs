//! # Migration Orchestration
//!
//! The bounded-concurrency core of a run, leaves first:
//!
//! - [`transform`]: derives balances, allocations and audits from a customer
//! - [`DetailFetcher`]: one API call per sub-group, mapped to per-user results
//! - [`BatchCoordinator`]: sub-group splitting under a run-wide concurrency cap
//! - [`PipelineDriver`]: macro-batching, pacing and aggregation

pub mod batch_coordinator;
pub mod detail_fetcher;
pub mod pipeline;
pub mod transform;

pub use batch_coordinator::{split_into_sub_groups, BatchCoordinator};
pub use detail_fetcher::DetailFetcher;
pub use pipeline::PipelineDriver;
