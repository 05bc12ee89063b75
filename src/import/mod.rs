//! Import parsing and reconciliation.
//!
//! Recipes arrive from untrusted channels (JSON files, scanned share
//! payloads, restored backups). Parsing drops structurally invalid records,
//! then [`reconcile`] flags name collisions and re-identifies what remains
//! before anything reaches the store.

use std::path::{Path, PathBuf};

use crate::models::{imported_id, Recipe};

/// Author assigned to imported recipes that arrive without one.
pub const IMPORTED_AUTHOR: &str = "Imported";

#[derive(Debug)]
pub enum ImportError {
    /// The file could not be read.
    Io(PathBuf, std::io::Error),
    /// The document is not valid JSON.
    Format(serde_json::Error),
    /// The document parsed but contained no structurally valid recipe.
    NoValidRecipes,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ImportError::Format(e) => write!(f, "Invalid JSON format: {}", e),
            ImportError::NoValidRecipes => write!(f, "No valid recipes found"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(_, e) => Some(e),
            ImportError::Format(e) => Some(e),
            ImportError::NoValidRecipes => None,
        }
    }
}

/// Outcome of reconciling a candidate batch against an existing collection.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Candidates cleared for insertion, re-identified and normalized.
    /// Name collisions stay in this list; the caller decides their fate.
    pub accepted: Vec<Recipe>,
    /// Names (as they arrived) that collide with the existing collection.
    pub duplicates: Vec<String>,
}

impl Reconciled {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Parses an import document: either a single recipe object or an array.
///
/// Entries missing a required field (id, name, sensor, simulation,
/// dynamicRange, whiteBalance) or carrying unparseable enum values are
/// silently dropped; they count as neither accepted nor duplicate.
pub fn parse_import(text: &str) -> Result<Vec<Recipe>, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(ImportError::Format)?;

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        other => vec![other],
    };

    let recipes: Vec<Recipe> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if recipes.is_empty() {
        return Err(ImportError::NoValidRecipes);
    }
    Ok(recipes)
}

/// Reads and parses an import file.
pub fn parse_import_file(path: &Path) -> Result<Vec<Recipe>, ImportError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| ImportError::Io(path.to_path_buf(), e))?;
    parse_import(&text)
}

/// Merges a candidate batch against the existing collection.
///
/// Every candidate gets a fresh identity (inbound ids are never trusted),
/// a sentinel author when blank, and its favorite flag cleared. Candidates
/// whose name matches an existing recipe case-insensitively are reported in
/// `duplicates` but kept in `accepted` pending the caller's decision.
pub fn reconcile(candidates: Vec<Recipe>, existing: &[Recipe]) -> Reconciled {
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut duplicates = Vec::new();

    for mut candidate in candidates {
        let collides = existing
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(&candidate.name));
        if collides {
            duplicates.push(candidate.name.clone());
        }

        candidate.id = imported_id();
        if candidate.author.trim().is_empty() {
            candidate.author = IMPORTED_AUTHOR.to_string();
        }
        candidate.is_favorite = false;
        accepted.push(candidate);
    }

    Reconciled {
        accepted,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilmSimulation, SensorType};

    fn minimal_json(name: &str) -> String {
        format!(
            r#"{{
                "id": "x",
                "name": "{}",
                "sensor": "X-Trans V",
                "simulation": "Provia/Standard",
                "dynamicRange": "DR100",
                "whiteBalance": "Auto"
            }}"#,
            name
        )
    }

    #[test]
    fn test_parse_single_object() {
        let recipes = parse_import(&minimal_json("Solo")).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Solo");
    }

    #[test]
    fn test_parse_array() {
        let doc = format!("[{},{}]", minimal_json("One"), minimal_json("Two"));
        let recipes = parse_import(&doc).unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[test]
    fn test_parse_drops_malformed_entries_silently() {
        let doc = format!(
            r#"[{}, {{"name": "missing required fields"}}]"#,
            minimal_json("Good")
        );
        let recipes = parse_import(&doc).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Good");
    }

    #[test]
    fn test_parse_not_json_is_format_error() {
        assert!(matches!(
            parse_import("not json at all"),
            Err(ImportError::Format(_))
        ));
    }

    #[test]
    fn test_parse_all_invalid_is_no_valid_recipes() {
        assert!(matches!(
            parse_import(r#"[{"name": "nope"}]"#),
            Err(ImportError::NoValidRecipes)
        ));
    }

    #[test]
    fn test_reconcile_assigns_fresh_ids_and_defaults() {
        let candidates = parse_import(&minimal_json("Fresh")).unwrap();
        let original_id = candidates[0].id.clone();

        let result = reconcile(candidates, &[]);
        assert_eq!(result.accepted.len(), 1);
        assert!(result.duplicates.is_empty());

        let imported = &result.accepted[0];
        assert_ne!(imported.id, original_id);
        assert!(imported.id.starts_with("imported-"));
        assert_eq!(imported.author, IMPORTED_AUTHOR);
        assert!(!imported.is_favorite);
    }

    #[test]
    fn test_reconcile_clears_inbound_favorite() {
        let mut candidate = Recipe::new(
            "Pre-favorited",
            "someone",
            SensorType::XTransIII,
            FilmSimulation::Acros,
        );
        candidate.is_favorite = true;

        let result = reconcile(vec![candidate], &[]);
        assert!(!result.accepted[0].is_favorite);
        // An explicit author survives.
        assert_eq!(result.accepted[0].author, "someone");
    }

    #[test]
    fn test_reconcile_flags_duplicates_but_keeps_them() {
        let existing = vec![Recipe::new(
            "Kodachrome 64",
            "me",
            SensorType::XTransV,
            FilmSimulation::ClassicChrome,
        )];
        let candidate = parse_import(&minimal_json("KODACHROME 64")).unwrap();

        let result = reconcile(candidate, &existing);
        assert_eq!(result.duplicates, vec!["KODACHROME 64".to_string()]);
        // Flagged, not rejected: still in the accepted list for the caller.
        assert_eq!(result.accepted.len(), 1);
    }

    #[test]
    fn test_round_trip_through_store() {
        use crate::store::RecipeStore;

        let doc = format!("[{},{}]", minimal_json("Alpha"), minimal_json("beta"));
        let candidates = parse_import(&doc).unwrap();
        let result = reconcile(candidates, &[]);

        let mut store = RecipeStore::default();
        store.replace_all(result.accepted);

        let names: Vec<String> = store
            .recipes()
            .iter()
            .map(|r| r.name.to_ascii_lowercase())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(store.recipes().iter().all(|r| r.id.starts_with("imported-")));
    }
}
