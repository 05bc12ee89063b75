use clap::{Parser, Subcommand};
use std::path::PathBuf;

use filmdeck::commands::{
    BackupCommand, ConfigCommand, DeviceCommand, ImportCommand, RecipeCommand, ShareCommand,
    SlotCommand, SyncCommand,
};
use filmdeck::config::Config;

#[derive(Parser)]
#[command(name = "filmdeck")]
#[command(version)]
#[command(about = "A film simulation recipe catalog with multi-device sync", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe(RecipeCommand),

    /// Manage custom preset slots
    Slot(SlotCommand),

    /// Manage the selected camera body
    Device(DeviceCommand),

    /// Import recipes from a JSON file
    Import(ImportCommand),

    /// Share and export recipes
    Share(ShareCommand),

    /// Manage server-side backups
    Backup(BackupCommand),

    /// Sync with the remote mirror
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filmdeck=warn".into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Recipe(cmd)) => cmd.run(&config).await?,
        Some(Commands::Slot(cmd)) => cmd.run(&config).await?,
        Some(Commands::Device(cmd)) => cmd.run(&config).await?,
        Some(Commands::Import(cmd)) => cmd.run(&config).await?,
        Some(Commands::Share(cmd)) => cmd.run(&config).await?,
        Some(Commands::Backup(cmd)) => cmd.run(&config).await?,
        Some(Commands::Sync(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
