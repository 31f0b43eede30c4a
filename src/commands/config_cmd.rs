use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::{Config, ConfigSource};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_value(
                            "data_dir",
                            config.data_dir.value.display(),
                            &config.data_dir.source,
                        );
                        print_value(
                            "server_url",
                            &config.server_url.value,
                            &config.server_url.source,
                        );
                        let catalog = config
                            .catalog_path
                            .value
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "(built-in)".to_string());
                        print_value("catalog_path", catalog, &config.catalog_path.source);
                        print_value(
                            "duplicate_match",
                            config.duplicate_match.value,
                            &config.duplicate_match.source,
                        );
                        print_value(
                            "request_timeout_secs",
                            config.request_timeout_secs.value,
                            &config.request_timeout_secs.source,
                        );
                        print_value(
                            "saved_indicator_ms",
                            config.saved_indicator_ms.value,
                            &config.saved_indicator_ms.source,
                        );
                        print_value(
                            "failed_indicator_ms",
                            config.failed_indicator_ms.value,
                            &config.failed_indicator_ms.source,
                        );
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_value(key: &str, value: impl std::fmt::Display, source: &ConfigSource) {
    println!("{}: {}", key, value);
    println!("  source: {}", source);
    println!();
}
