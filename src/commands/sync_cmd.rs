//! Sync CLI commands for the remote mirror.

use clap::{Args, Subcommand};
use std::time::Duration;

use super::{key_preview, load_session};
use crate::config::Config;
use crate::remote::{DocKind, HttpMirror, RemoteError, RemoteMirror};
use crate::sync::SyncCoordinator;

/// Sync with the remote mirror
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: SyncSubcommand,
}

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,

    /// Push the local catalog and settings to the server
    Push,

    /// Pull the server's catalog and settings, replacing local state
    Pull,

    /// Run live sync until interrupted
    Watch,
}

impl SyncCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SyncSubcommand::Status => self.status(config).await,
            SyncSubcommand::Push => {
                let mut coordinator = coordinator(config)?;
                coordinator.push_now().await?;
                println!(
                    "Pushed {} recipe(s) and settings",
                    coordinator.store().recipes().len()
                );
                Ok(())
            }
            SyncSubcommand::Pull => {
                let mut coordinator = coordinator(config)?;
                coordinator.pull_now().await?;
                println!(
                    "Pulled {} recipe(s) and settings",
                    coordinator.store().recipes().len()
                );
                Ok(())
            }
            SyncSubcommand::Watch => {
                let mut coordinator = coordinator(config)?;
                coordinator.bootstrap().await?;
                println!(
                    "Live sync running ({} recipe(s)). Press Ctrl-C to stop.",
                    coordinator.store().recipes().len()
                );

                tokio::select! {
                    result = coordinator.run() => {
                        result?;
                        println!("Change feed closed by server.");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("\nStopping live sync.");
                    }
                }
                coordinator.suspend();
                Ok(())
            }
        }
    }

    async fn status(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    api_key: \"your-api-key\"");
            println!();
            println!("Or set environment variables:");
            println!("  FILMDECK_SERVER_URL");
            println!("  FILMDECK_API_KEY");
            return Ok(());
        }

        let server_url = config.sync.server_url.as_ref().unwrap();
        let api_key = config.sync.api_key.as_ref().unwrap();

        println!("Server:    {}", server_url);
        println!("API Key:   {}...", key_preview(api_key));
        println!(
            "Auto-sync: {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("Debounce:  {}ms", config.sync.debounce_ms);
        println!();

        print!("Server status: ");
        let mirror = HttpMirror::from_config(&config.sync)?;
        match mirror.exists(DocKind::Recipes).await {
            Ok(true) => println!("connected, recipes document present"),
            Ok(false) => println!("connected, no recipes document yet"),
            Err(RemoteError::Connection(_)) => println!("unreachable"),
            Err(e) => println!("error: {}", e),
        }
        Ok(())
    }
}

fn coordinator(config: &Config) -> Result<SyncCoordinator<HttpMirror>, RemoteError> {
    let mirror = HttpMirror::from_config(&config.sync)?;
    let (local, store) = load_session(config);
    Ok(SyncCoordinator::new(
        store,
        local,
        mirror,
        Duration::from_millis(config.sync.debounce_ms),
    ))
}
