use clap::{Args, Subcommand};

use super::{confirm, load_session, persist_session, try_auto_push};
use crate::config::Config;
use crate::models::Backup;
use crate::remote::{HttpMirror, RemoteMirror};

/// Manage server-side backup snapshots
#[derive(Args)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub command: BackupSubcommand,
}

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// Snapshot the current catalog and settings to the server
    Create,

    /// List stored backups, newest first
    List,

    /// Replace the catalog and settings with a stored backup
    Restore {
        /// Backup ID (from `backup list`)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Delete a stored backup
    Delete {
        /// Backup ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl BackupCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mirror = HttpMirror::from_config(&config.sync)?;

        match &self.command {
            BackupSubcommand::Create => {
                let (_, store) = load_session(config);
                let backup = Backup::new(store.recipes().to_vec(), store.settings().clone());
                let id = mirror.create_backup(&backup).await?;
                println!(
                    "Created backup {} ({} recipe(s))",
                    id,
                    backup.recipes.len()
                );
                Ok(())
            }

            BackupSubcommand::List => {
                let backups = mirror.list_backups().await?;
                if backups.is_empty() {
                    println!("No backups stored");
                    return Ok(());
                }
                println!("{:<16}  CREATED", "ID");
                println!("{}", "-".repeat(44));
                for info in &backups {
                    println!(
                        "{:<16}  {}",
                        info.id,
                        info.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                println!("\nTotal: {} backup(s)", backups.len());
                Ok(())
            }

            BackupSubcommand::Restore { id, force } => {
                let backup = mirror
                    .get_backup(id)
                    .await?
                    .ok_or_else(|| format!("Backup not found: {}", id))?;

                if !force
                    && !confirm(&format!(
                        "Restore backup {} ({} recipe(s))? This replaces the current catalog.",
                        id,
                        backup.recipes.len()
                    ))?
                {
                    println!("Restore cancelled.");
                    return Ok(());
                }

                let (local, mut store) = load_session(config);
                let count = backup.recipes.len();
                store.replace_all(backup.recipes);
                store.replace_settings(backup.settings);
                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Restored {} recipe(s) from backup {}", count, id);
                Ok(())
            }

            BackupSubcommand::Delete { id, force } => {
                if !force && !confirm(&format!("Delete backup {}?", id))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
                mirror.delete_backup(id).await?;
                println!("Deleted backup {}", id);
                Ok(())
            }
        }
    }
}
