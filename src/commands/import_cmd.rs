use clap::Args;
use std::path::PathBuf;

use super::{confirm, load_session, persist_session, try_auto_push};
use crate::config::Config;
use crate::import::{parse_import_file, reconcile};

/// Import recipes from a JSON file
#[derive(Args)]
pub struct ImportCommand {
    /// Path to a JSON file holding one recipe or an array of recipes
    pub file: PathBuf,

    /// Import duplicates without asking
    #[arg(long, short)]
    pub force: bool,
}

impl ImportCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (local, mut store) = load_session(config);

        let candidates = parse_import_file(&self.file)?;
        let reconciled = reconcile(candidates, store.recipes());

        if reconciled.has_duplicates() && !self.force {
            println!("These recipes already exist by name:");
            for name in &reconciled.duplicates {
                println!("  - {}", name);
            }
            if !confirm("Import them anyway?")? {
                println!("Import cancelled.");
                return Ok(());
            }
        }

        // Duplicates arrive pre-approved at this point, so the batch goes
        // in through the trusted replace path instead of per-recipe
        // uniqueness checks.
        let mut merged = reconciled.accepted.clone();
        let imported = merged.len();
        merged.extend(store.recipes().iter().cloned());
        store.replace_all(merged);

        persist_session(&local, &store);
        try_auto_push(config, &store).await;

        println!("Imported {} recipe(s) from {}", imported, self.file.display());
        Ok(())
    }
}
