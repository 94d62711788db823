//! Validate config command implementation

use crate::config::load_config;
use crate::core::filter::FilterSpec;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also validate a JSON filter document
    #[arg(long)]
    pub filter: Option<String>,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = config.validate() {
            println!("Configuration is invalid");
            println!("   Error: {e}");
            return Ok(2);
        }

        println!("Configuration is valid");
        println!();
        println!("Configuration summary:");
        println!("  Log level: {}", config.application.log_level);
        println!(
            "  Database: {}",
            config
                .database
                .connection_string
                .split('@')
                .next_back()
                .unwrap_or("***")
        );
        println!("  Max connections: {}", config.database.max_connections);
        println!("  Output: {}", config.export.output_path);
        println!(
            "  Row cap: {}",
            config
                .export
                .effective_cap()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        println!(
            "  Window: {} (bounds [{}, {}])",
            config.export.window.initial_size,
            config.export.window.min_size,
            config.export.window.max_size
        );
        println!("  Partner chunk size: {}", config.export.partners.chunk_size);

        if let Some(path) = &self.filter {
            println!();
            println!("Validating filter document: {path}");
            let content = std::fs::read_to_string(path)?;
            match FilterSpec::from_json_str(&content).and_then(|spec| spec.compile()) {
                Ok(compiled) => {
                    println!(
                        "Filter is valid ({} clause(s))",
                        compiled.clause_count()
                    );
                }
                Err(e) => {
                    println!("Filter is invalid");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            }
        }

        Ok(0)
    }
}
