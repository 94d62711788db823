//! Result type alias for the exporter

use crate::domain::errors::CnpjError;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, CnpjError>;
