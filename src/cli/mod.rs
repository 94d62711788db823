//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// cnpj-export - CNPJ registry extraction and CSV export
#[derive(Parser, Debug)]
#[command(name = "cnpj-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "cnpj-export.toml", env = "CNPJ_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CNPJ_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export against the configured registry
    Export(commands::export::ExportArgs),

    /// Validate the configuration file and an optional filter document
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["cnpj-export", "export", "--yes"]);
        assert_eq!(cli.config, "cnpj-export.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["cnpj-export", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "cnpj-export",
            "export",
            "--limit",
            "500",
            "--output",
            "out.csv",
        ]);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.limit, Some(500));
                assert_eq!(args.output.as_deref(), Some("out.csv"));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["cnpj-export", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["cnpj-export", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
