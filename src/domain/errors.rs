//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types.
//! Store errors carry a transient/fatal distinction so the paginator and
//! the partner resolver can decide whether a retry is worthwhile.

use thiserror::Error;

/// Main error type for the exporter
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CnpjError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Filter specification validation errors; `field` names the offending
    /// filter dimension
    #[error("Invalid filter '{field}': {message}")]
    FilterValidation { field: String, message: String },

    /// Store (database) errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A required lookup table could not be loaded
    #[error("Required lookup '{kind}' could not be loaded: {message}")]
    LookupUnavailable { kind: String, message: String },

    /// Partner resolution failed after the configured retries
    #[error("Partner resolution failed for a sub-chunk of {chunk_len} keys: {message}")]
    PartnerResolution { chunk_len: usize, message: String },

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Output sink errors
    #[error("Output error: {0}")]
    Output(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Store-level errors with a transient/fatal split
///
/// `Transient` failures (timeouts, dropped connections) are safe to retry:
/// keyset pagination re-issues the same cursor and the partner resolver
/// re-issues the same key set. Everything else escalates immediately.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to obtain a connection from the pool
    #[error("Failed to get connection from pool: {0}")]
    Pool(String),

    /// Transient retrieval failure (timeout, connection reset)
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// Query failed for a non-transient reason
    #[error("Query failed: {0}")]
    Query(String),

    /// A row could not be decoded into its domain record
    #[error("Row decode failed: {0}")]
    Decode(String),

    /// Invalid connection configuration
    #[error("Invalid store configuration: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether a retry with the same statement is worthwhile
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Pool(_))
    }

    /// Classify a tokio-postgres error into transient or query failure
    pub fn from_db(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return StoreError::Transient(err.to_string());
        }
        let msg = err.to_string();
        // statement_timeout surfaces as SQLSTATE 57014 (query_canceled);
        // class 08 covers connection exceptions
        if let Some(code) = err.code() {
            if code.code() == "57014" || code.code().starts_with("08") {
                return StoreError::Transient(msg);
            }
        }
        StoreError::Query(msg)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CnpjError {
    fn from(err: std::io::Error) -> Self {
        CnpjError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CnpjError {
    fn from(err: serde_json::Error) -> Self {
        CnpjError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CnpjError {
    fn from(err: toml::de::Error) -> Self {
        CnpjError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for CnpjError {
    fn from(err: csv::Error) -> Self {
        CnpjError::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CnpjError::Configuration("missing output path".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing output path");
    }

    #[test]
    fn test_filter_validation_names_field() {
        let err = CnpjError::FilterValidation {
            field: "uf".to_string(),
            message: "expected a two-letter code".to_string(),
        };
        assert!(err.to_string().contains("uf"));
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::Transient("connection reset".to_string());
        assert!(store_err.is_transient());
        let err: CnpjError = store_err.into();
        assert!(matches!(err, CnpjError::Store(_)));
    }

    #[test]
    fn test_query_error_not_transient() {
        let store_err = StoreError::Query("syntax error".to_string());
        assert!(!store_err.is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CnpjError = io_err.into();
        assert!(matches!(err, CnpjError::Io(_)));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = CnpjError::Export("boom".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
