//! Core domain types and models
//!
//! This module contains the domain layer: identifier newtypes, the
//! records read from the registry store, and the crate-wide error type.

pub mod errors;
pub mod keys;
pub mod records;
pub mod result;

// Re-export commonly used types
pub use errors::{CnpjError, StoreError};
pub use keys::{CompositeKey, EntityKey};
pub use records::{EstablishmentRow, PartnerRecord};
pub use result::Result;
