//! Export command implementation

use crate::config::load_config;
use crate::core::export::{ExportCoordinator, RunStatus};
use crate::core::filter::FilterSpec;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the configured row cap (0 = safety cap only)
    #[arg(long)]
    pub limit: Option<u64>,

    /// Override the configured output path
    #[arg(long)]
    pub output: Option<String>,

    /// Path to a JSON filter document
    #[arg(long)]
    pub filter: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = load_config(config_path)?;

        if let Some(limit) = self.limit {
            tracing::info!(limit, "Overriding row cap from CLI");
            config.export.row_cap = limit;
        }
        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output path from CLI");
            config.export.output_path = output.clone();
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let filter = match &self.filter {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                FilterSpec::from_json_str(&content)?
            }
            None => FilterSpec::default(),
        };

        // Filter problems surface before the prompt and before connecting
        let compiled = match filter.compile() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Filter validation failed");
                eprintln!("Filter validation failed: {e}");
                return Ok(2);
            }
        };

        if !self.yes {
            println!("Export configuration:");
            println!("  Output: {}", config.export.output_path);
            println!(
                "  Row cap: {}",
                config
                    .export
                    .effective_cap()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unbounded".to_string())
            );
            println!("  Filter clauses: {}", compiled.clause_count());
            println!("  Initial window: {}", config.export.window.initial_size);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        let coordinator = match ExportCoordinator::new(config).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to the registry");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4);
            }
        };

        let summary = coordinator.run(&filter, shutdown_signal).await?;

        println!();
        println!("Export {}", summary.status.as_str());
        println!("  Rows exported: {}", summary.rows_exported);
        println!("  Windows: {}", summary.windows);
        println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
        println!("  Throughput: {:.0} rows/s", summary.rows_per_second());
        if let Some(cursor) = &summary.last_cursor {
            println!("  Last cursor: {cursor}");
        }

        Ok(match summary.status {
            RunStatus::CompletedExhausted | RunStatus::CompletedCapReached => 0,
            RunStatus::Aborted => 3,
        })
    }
}
