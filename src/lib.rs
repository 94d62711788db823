// cnpj-export - CNPJ registry extraction and CSV export tool
// Licensed under the MIT License

//! # cnpj-export
//!
//! A batched extraction and export pipeline over a PostgreSQL copy of
//! the Brazilian CNPJ company registry. It joins establishments with
//! their legal entity, tax-regime flags and partner records, enriches
//! them against preloaded lookup tables, applies optional filter
//! criteria and writes a flattened, semicolon-delimited CSV.
//!
//! The pipeline is built to stay flat in memory and throughput across
//! tens of millions of rows: keyset pagination instead of offsets, an
//! adaptive window size driven by measured per-window latency, and
//! window-by-window flushing of the output.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline logic (pagination, enrichment, filtering, export)
//! - [`adapters`] - PostgreSQL registry access
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`output`] - CSV sink
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cnpj_export::config::load_config;
//! use cnpj_export::core::export::ExportCoordinator;
//! use cnpj_export::core::filter::FilterSpec;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("cnpj-export.toml")?;
//!     let coordinator = ExportCoordinator::new(config).await?;
//!
//!     let (_tx, shutdown) = watch::channel(false);
//!     let summary = coordinator.run(&FilterSpec::default(), shutdown).await?;
//!
//!     println!("Exported {} rows", summary.rows_exported);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod output;
