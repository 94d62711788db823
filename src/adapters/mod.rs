//! External integrations
//!
//! The pipeline reads from a single PostgreSQL-backed registry store;
//! the traits in [`traits`] are the seams the pipeline stages consume
//! it through.

pub mod postgres;
pub mod traits;
