use clap::{Args, Subcommand};

use super::{key_preview, OutputFormat};
use crate::config::Config;

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

    /// Print the config file path
    Path,
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
                        println!("data_dir: {}", config.data_dir.display());
                        println!("author: {}", config.author);
                        println!();
                        println!("sync:");
                        println!(
                            "  server_url: {}",
                            config.sync.server_url.as_deref().unwrap_or("(not set)")
                        );
                        match &config.sync.api_key {
                            Some(key) => {
                                println!("  api_key: {}...", key_preview(key))
                            }
                            None => println!("  api_key: (not set)"),
                        }
                        println!("  auto_sync: {}", config.sync.auto_sync);
                        println!("  debounce_ms: {}", config.sync.debounce_ms);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Path => {
                println!("{}", Config::default_config_path().display());
                Ok(())
            }
        }
    }
}
