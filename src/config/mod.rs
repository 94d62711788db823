//! Configuration management
//!
//! TOML configuration with `${VAR}` environment substitution,
//! `CNPJ_EXPORT_*` overrides and boundary validation.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DatabaseConfig, ExportConfig, ExporterConfig, LoggingConfig, PartnerConfig,
    RetryConfig, WindowConfig,
};
