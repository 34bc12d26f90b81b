// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod assist;
pub mod config;
pub mod ingest;
pub mod model;
pub mod relevance;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateReport, Aggregator};
pub use crate::ingest::{RawJob, SourceAdapter, SourceError};
pub use crate::model::{JobPosting, Preferences, SearchQuery};
pub use crate::relevance::Scorer;
