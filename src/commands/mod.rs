//! CLI command implementations.

mod backup;
mod config_cmd;
mod export;
mod import_cmd;
mod recipe;
mod slot;
mod sync_cmd;

pub use backup::BackupCommand;
pub use config_cmd::ConfigCommand;
pub use export::ShareCommand;
pub use import_cmd::ImportCommand;
pub use recipe::RecipeCommand;
pub use slot::{DeviceCommand, SlotCommand};
pub use sync_cmd::SyncCommand;

use std::io::{self, Write};

use clap::ValueEnum;

use crate::config::Config;
use crate::persist::LocalStore;
use crate::remote::{HttpMirror, RemoteMirror};
use crate::store::RecipeStore;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Opens the local store and loads the session state from disk.
pub(crate) fn load_session(config: &Config) -> (LocalStore, RecipeStore) {
    let local = LocalStore::new(&config.data_dir);
    let recipes = local.load_recipes().unwrap_or_default();
    let settings = local.load_settings().unwrap_or_default();
    (local, RecipeStore::new(recipes, settings))
}

/// Writes the session state back to disk.
pub(crate) fn persist_session(local: &LocalStore, store: &RecipeStore) {
    local.save_recipes(store.recipes());
    local.save_settings(store.settings());
}

/// Pushes the session state to the sync server when auto-sync is on.
/// Failures are reported but never fail the command; the local write
/// already succeeded.
pub(crate) async fn try_auto_push(config: &Config, store: &RecipeStore) {
    if !config.sync.auto_sync || !config.sync.is_configured() {
        return;
    }
    let mirror = match HttpMirror::from_config(&config.sync) {
        Ok(mirror) => mirror,
        Err(e) => {
            eprintln!("Warning: sync not available: {}", e);
            return;
        }
    };
    if let Err(e) = mirror.put_recipes(store.recipes()).await {
        eprintln!("Warning: failed to push recipes: {}", e);
        return;
    }
    if let Err(e) = mirror.put_settings(store.settings()).await {
        eprintln!("Warning: failed to push settings: {}", e);
    }
}

/// y/N confirmation prompt.
pub(crate) fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// First characters of an API key for status output, so the key itself
/// never lands in a terminal scrollback. Counts characters, not bytes.
pub(crate) fn key_preview(key: &str) -> String {
    key.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::key_preview;

    #[test]
    fn test_key_preview_takes_a_short_prefix() {
        assert_eq!(key_preview("fd_1234567890abcdef"), "fd_12345");
        assert_eq!(key_preview("short"), "short");
    }

    #[test]
    fn test_key_preview_handles_multibyte_keys() {
        // A key pasted with non-ASCII characters must not split mid-char.
        assert_eq!(key_preview("key-éééééééé"), "key-éééé");
    }
}
