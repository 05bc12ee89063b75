use clap::{Args, Subcommand};

use super::{load_session, persist_session, try_auto_push};
use crate::config::Config;
use crate::models::{Device, UserSettings};

#[derive(Args)]
pub struct SlotCommand {
    #[command(subcommand)]
    pub command: SlotSubcommand,
}

#[derive(Subcommand)]
pub enum SlotSubcommand {
    /// Show the selected device's custom slot assignments
    List,

    /// Point a custom slot at a recipe
    Assign {
        /// Slot key (e.g. C1)
        slot: String,

        /// Recipe ID or name
        identifier: String,
    },

    /// Clear a custom slot
    Clear {
        /// Slot key (e.g. C1)
        slot: String,
    },
}

/// Normalizes and checks a slot key against the selected device.
fn resolve_slot(settings: &UserSettings, slot: &str) -> Result<String, String> {
    let wanted = slot.to_ascii_uppercase();
    let keys = UserSettings::slot_keys(&settings.device);
    if keys.contains(&wanted) {
        Ok(wanted)
    } else if keys.is_empty() {
        Err(format!("{} has no custom slots", settings.device.name))
    } else {
        Err(format!(
            "Unknown slot '{}'. {} has slots C1..C{}",
            slot, settings.device.name, settings.device.custom_slot_count
        ))
    }
}

impl SlotCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (local, mut store) = load_session(config);

        match &self.command {
            SlotSubcommand::List => {
                let settings = store.settings();
                println!("{}", settings.device);
                println!();
                for key in UserSettings::slot_keys(&settings.device) {
                    let assigned = settings.custom_slots.get(&key).cloned().unwrap_or(None);
                    match assigned {
                        // A slot may reference a recipe that was deleted;
                        // show it as empty rather than failing.
                        Some(id) => match store.get(&id) {
                            Some(recipe) => println!("{}: {}", key, recipe.name),
                            None => println!("{}: (empty)", key),
                        },
                        None => println!("{}: (empty)", key),
                    }
                }
                Ok(())
            }

            SlotSubcommand::Assign { slot, identifier } => {
                let slot = resolve_slot(store.settings(), slot)?;
                let recipe = store
                    .find(identifier)
                    .cloned()
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;

                store.assign_slot(&slot, Some(recipe.id.clone()));
                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Assigned '{}' to {}", recipe.name, slot);
                Ok(())
            }

            SlotSubcommand::Clear { slot } => {
                let slot = resolve_slot(store.settings(), slot)?;
                store.assign_slot(&slot, None);
                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Cleared {}", slot);
                Ok(())
            }
        }
    }
}

#[derive(Args)]
pub struct DeviceCommand {
    #[command(subcommand)]
    pub command: DeviceSubcommand,
}

#[derive(Subcommand)]
pub enum DeviceSubcommand {
    /// List supported camera bodies
    List,

    /// Select a camera body
    Set {
        /// Device ID (e.g. x100vi, xt5)
        id: String,
    },
}

impl DeviceCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DeviceSubcommand::List => {
                let selected = {
                    let (_, store) = load_session(config);
                    store.settings().device.id.clone()
                };
                println!("{:<10}  {:<22}  {:<12}  SLOTS", "ID", "NAME", "SENSOR");
                println!("{}", "-".repeat(56));
                for device in Device::catalog() {
                    let marker = if device.id == selected { " (selected)" } else { "" };
                    println!(
                        "{:<10}  {:<22}  {:<12}  {}{}",
                        device.id,
                        device.name,
                        device.sensor.to_string(),
                        device.custom_slot_count,
                        marker
                    );
                }
                Ok(())
            }

            DeviceSubcommand::Set { id } => {
                let device =
                    Device::find(id).ok_or_else(|| format!("Unknown device: {}", id))?;
                let (local, mut store) = load_session(config);
                store.set_device(device);
                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Selected {}", store.settings().device);
                Ok(())
            }
        }
    }
}
