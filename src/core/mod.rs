//! Core pipeline logic
//!
//! Everything between the registry store and the CSV sink: lookup
//! preloading, filter compilation, keyset pagination, partner
//! aggregation, enrichment and the run coordinator.

pub mod batch;
pub mod enrich;
pub mod export;
pub mod filter;
pub mod lookup;
pub mod paginate;
pub mod partners;
