use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::{confirm, load_session, persist_session, try_auto_push, OutputFormat};
use crate::config::Config;
use crate::import::reconcile;
use crate::share::{self, SharePayload};

#[derive(Clone, ValueEnum, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
    Share,
}

/// Share and export recipes
#[derive(Args)]
pub struct ShareCommand {
    #[command(subcommand)]
    pub command: ShareSubcommand,
}

#[derive(Subcommand)]
pub enum ShareSubcommand {
    /// Export recipes for use elsewhere
    Export {
        /// Recipe ID or name; omit with --all to export everything
        identifier: Option<String>,

        /// Export the whole collection
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Encode a recipe as a base64 share string
    Encode {
        /// Recipe ID or name
        identifier: String,
    },

    /// Decode a share string or payload and show its contents
    Decode {
        /// Base64 share string or raw payload JSON
        payload: String,

        /// Import the decoded contents into the catalog
        #[arg(long)]
        save: bool,

        /// Skip confirmation prompts
        #[arg(long, short)]
        force: bool,

        /// Output format for display
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ShareCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ShareSubcommand::Export {
                identifier,
                all,
                format,
                output,
            } => {
                let (_, store) = load_session(config);
                let text = if *all {
                    match format {
                        ExportFormat::Json => serde_json::to_string_pretty(store.recipes())?,
                        ExportFormat::Text => store
                            .recipes()
                            .iter()
                            .map(|r| r.to_string())
                            .collect::<Vec<_>>()
                            .join("\n"),
                        ExportFormat::Share => {
                            return Err(
                                "The share format encodes one recipe; use `share encode`".into()
                            )
                        }
                    }
                } else {
                    let identifier = identifier
                        .as_ref()
                        .ok_or("Provide a recipe identifier or --all")?;
                    let recipe = store
                        .find(identifier)
                        .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                    match format {
                        ExportFormat::Json => serde_json::to_string_pretty(recipe)?,
                        ExportFormat::Text => recipe.to_string(),
                        ExportFormat::Share => share::encode_share_string(recipe),
                    }
                };

                match output {
                    Some(path) => {
                        std::fs::write(path, text)?;
                        println!("Exported to {}", path.display());
                    }
                    None => println!("{}", text),
                }
                Ok(())
            }

            ShareSubcommand::Encode { identifier } => {
                let (_, store) = load_session(config);
                let recipe = store
                    .find(identifier)
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                println!("{}", share::encode_share_string(recipe));
                Ok(())
            }

            ShareSubcommand::Decode {
                payload,
                save,
                force,
                format,
            } => {
                // Accept both transport base64 and the raw JSON payload.
                let decoded = share::decode_share_string(payload)
                    .or_else(|_| share::decode(payload))?;

                match decoded {
                    SharePayload::Recipe(recipe) => {
                        match format {
                            OutputFormat::Json => {
                                println!("{}", serde_json::to_string_pretty(&recipe)?);
                            }
                            OutputFormat::Text => {
                                println!("{}", recipe);
                            }
                        }
                        if *save {
                            let (local, mut store) = load_session(config);
                            let reconciled = reconcile(vec![recipe], store.recipes());
                            if reconciled.has_duplicates()
                                && !force
                                && !confirm("A recipe with this name already exists. Import anyway?")?
                            {
                                println!("Import cancelled.");
                                return Ok(());
                            }
                            let mut merged = reconciled.accepted;
                            merged.extend(store.recipes().iter().cloned());
                            store.replace_all(merged);
                            persist_session(&local, &store);
                            try_auto_push(config, &store).await;
                            println!("Saved to catalog.");
                        }
                        Ok(())
                    }

                    SharePayload::Backup { recipes, settings } => {
                        println!(
                            "Backup payload: {} recipe(s), device {}",
                            recipes.len(),
                            settings.device.name
                        );
                        if *save {
                            if !force
                                && !confirm(
                                    "Restoring replaces the whole catalog and settings. Continue?",
                                )?
                            {
                                println!("Restore cancelled.");
                                return Ok(());
                            }
                            let (local, mut store) = load_session(config);
                            store.replace_all(recipes);
                            store.replace_settings(settings);
                            persist_session(&local, &store);
                            try_auto_push(config, &store).await;
                            println!("Catalog restored from payload.");
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}
