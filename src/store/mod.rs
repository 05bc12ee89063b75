//! In-memory authoritative recipe collection.
//!
//! The store owns the session's recipes and settings and enforces the
//! validation invariants (unique names, parameter bounds). Every effective
//! mutation bumps a revision counter; the persistence and sync layers watch
//! that counter instead of diffing contents.

use crate::models::{Device, Recipe, RecipeUpdate, UserSettings};

/// Validation errors. These abort the operation and leave the store
/// unchanged.
#[derive(Debug)]
pub enum StoreError {
    /// A recipe with this name already exists (case-insensitive match).
    DuplicateName(String),
    /// A parameter value is outside its allowed range.
    OutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
    /// Rating outside 0..=5.
    InvalidRating(u8),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateName(name) => {
                write!(f, "A recipe named \"{}\" already exists", name)
            }
            StoreError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} must be between {} and {}, got {}", field, min, max, value),
            StoreError::InvalidRating(r) => {
                write!(f, "Rating must be between 0 and 5, got {}", r)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Checks every bounded parameter of a recipe.
pub fn validate_bounds(recipe: &Recipe) -> Result<(), StoreError> {
    let checks: [(&'static str, i32, i32, i32); 8] = [
        ("WB shift R", recipe.wb_shift_r, -9, 9),
        ("WB shift B", recipe.wb_shift_b, -9, 9),
        ("Highlight", recipe.highlight, -2, 4),
        ("Shadow", recipe.shadow, -2, 4),
        ("Color", recipe.color, -4, 4),
        ("Sharpness", recipe.sharpness, -4, 4),
        ("Noise reduction", recipe.noise_reduction, -4, 4),
        ("Clarity", recipe.clarity.unwrap_or(0), -5, 5),
    ];
    for (field, value, min, max) in checks {
        if value < min || value > max {
            return Err(StoreError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
    }
    if let Some(rating) = recipe.personal_rating {
        if rating > 5 {
            return Err(StoreError::InvalidRating(rating));
        }
    }
    Ok(())
}

/// The session's recipe collection and settings.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
    settings: UserSettings,
    revision: u64,
}

impl RecipeStore {
    pub fn new(recipes: Vec<Recipe>, settings: UserSettings) -> Self {
        Self {
            recipes,
            settings,
            revision: 0,
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Monotonic change counter. Unchanged between observations means the
    /// store content is unchanged.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Finds a recipe by exact id or case-insensitive name.
    pub fn find(&self, identifier: &str) -> Option<&Recipe> {
        self.get(identifier).or_else(|| {
            self.recipes
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(identifier))
        })
    }

    fn has_name(&self, name: &str) -> bool {
        self.recipes.iter().any(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Adds a recipe at the front of the collection (most recent first).
    ///
    /// Rejects duplicate names (case-insensitive) and out-of-range
    /// parameter values without modifying the collection.
    pub fn add(&mut self, recipe: Recipe) -> Result<(), StoreError> {
        if self.has_name(&recipe.name) {
            return Err(StoreError::DuplicateName(recipe.name));
        }
        validate_bounds(&recipe)?;
        self.recipes.insert(0, recipe);
        self.revision += 1;
        Ok(())
    }

    /// Merges partial fields into the matching recipe.
    ///
    /// Unknown ids are a silent no-op: a remote-originated update may race
    /// with a local replace that removed the record.
    pub fn update(&mut self, id: &str, update: &RecipeUpdate) {
        if update.is_empty() {
            return;
        }
        if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) {
            update.apply(recipe);
            self.revision += 1;
        }
    }

    /// Flips the favorite flag. No-op on unknown id.
    pub fn toggle_favorite(&mut self, id: &str) {
        if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) {
            recipe.is_favorite = !recipe.is_favorite;
            self.revision += 1;
        }
    }

    /// Sets the personal rating and notes. Rating 0 clears both fields so
    /// "unrated" stays distinguishable from "rated 0". No-op on unknown id.
    pub fn set_rating(
        &mut self,
        id: &str,
        rating: u8,
        notes: Option<String>,
    ) -> Result<(), StoreError> {
        if rating > 5 {
            return Err(StoreError::InvalidRating(rating));
        }
        if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) {
            if rating == 0 {
                recipe.personal_rating = None;
                recipe.personal_notes = None;
            } else {
                recipe.personal_rating = Some(rating);
                recipe.personal_notes = notes;
            }
            self.revision += 1;
        }
        Ok(())
    }

    /// Replaces the whole collection. Trusted path used by sync apply and
    /// backup restore; uniqueness validation is bypassed.
    pub fn replace_all(&mut self, recipes: Vec<Recipe>) {
        self.recipes = recipes;
        self.revision += 1;
    }

    /// Replaces the settings object wholesale. Trusted path, see
    /// [`replace_all`](Self::replace_all).
    pub fn replace_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
        self.revision += 1;
    }

    /// Points a custom slot at a recipe id, or clears it.
    ///
    /// The referenced recipe is deliberately not checked for existence:
    /// slots hold non-owning references and dangling ones degrade to an
    /// empty-slot display.
    pub fn assign_slot(&mut self, slot: &str, recipe_id: Option<String>) {
        self.settings
            .custom_slots
            .insert(slot.to_string(), recipe_id);
        self.revision += 1;
    }

    /// Switches the selected device, keeping existing slot assignments for
    /// slot keys both devices share.
    pub fn set_device(&mut self, device: Device) {
        let keys = UserSettings::slot_keys(&device);
        let mut slots = std::collections::BTreeMap::new();
        for key in keys {
            let existing = self
                .settings
                .custom_slots
                .get(&key)
                .cloned()
                .unwrap_or(None);
            slots.insert(key, existing);
        }
        self.settings.device = device;
        self.settings.custom_slots = slots;
        self.revision += 1;
    }
}

impl Default for RecipeStore {
    fn default() -> Self {
        Self::new(Vec::new(), UserSettings::default())
    }
}
