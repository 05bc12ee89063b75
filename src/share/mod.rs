//! Share payload encode/decode.
//!
//! Two payload shapes travel over QR codes and share links:
//! - `{"type": "recipe", "data": {...}}` for a single recipe, with the
//!   image reference stripped to stay inside QR capacity;
//! - `{"recipes": [...], "settings": {...}}` for a full-backup transfer.
//!
//! The decoder dispatches on shape, not on trust: payload contents go
//! through the same validation as any other import.

use base64::prelude::*;
use serde::Serialize;

use crate::models::{Recipe, UserSettings};

#[derive(Debug)]
pub enum ShareError {
    /// The payload is not recognizable as either share shape.
    Format(String),
}

impl std::fmt::Display for ShareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareError::Format(msg) => write!(f, "Invalid share payload: {}", msg),
        }
    }
}

impl std::error::Error for ShareError {}

/// A decoded share payload.
#[derive(Debug, Clone)]
pub enum SharePayload {
    Recipe(Recipe),
    Backup {
        recipes: Vec<Recipe>,
        settings: UserSettings,
    },
}

#[derive(Serialize)]
struct RecipeEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a Recipe,
}

#[derive(Serialize)]
struct BackupEnvelope<'a> {
    recipes: &'a [Recipe],
    settings: &'a UserSettings,
}

/// Encodes a single recipe as a share payload, stripping the image.
pub fn encode_recipe(recipe: &Recipe) -> String {
    let stripped = recipe.without_image();
    let envelope = RecipeEnvelope {
        kind: "recipe",
        data: &stripped,
    };
    serde_json::to_string(&envelope).expect("recipe envelope serializes")
}

/// Encodes a full catalog snapshot as a share payload.
pub fn encode_backup(recipes: &[Recipe], settings: &UserSettings) -> String {
    let envelope = BackupEnvelope { recipes, settings };
    serde_json::to_string(&envelope).expect("backup envelope serializes")
}

/// Decodes a share payload, dispatching on its shape.
pub fn decode(text: &str) -> Result<SharePayload, ShareError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ShareError::Format(e.to_string()))?;

    if value.get("type").and_then(|t| t.as_str()) == Some("recipe") {
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| ShareError::Format("recipe payload missing data".to_string()))?;
        let recipe: Recipe = serde_json::from_value(data)
            .map_err(|e| ShareError::Format(format!("malformed recipe: {}", e)))?;
        return Ok(SharePayload::Recipe(recipe));
    }

    if value.get("recipes").is_some() && value.get("settings").is_some() {
        let recipes: Vec<Recipe> = serde_json::from_value(value["recipes"].clone())
            .map_err(|e| ShareError::Format(format!("malformed recipes: {}", e)))?;
        let settings: UserSettings = serde_json::from_value(value["settings"].clone())
            .map_err(|e| ShareError::Format(format!("malformed settings: {}", e)))?;
        return Ok(SharePayload::Backup { recipes, settings });
    }

    Err(ShareError::Format(
        "expected a recipe or backup payload".to_string(),
    ))
}

/// Base64 transport encoding for share strings and URLs.
pub fn encode_share_string(recipe: &Recipe) -> String {
    BASE64_STANDARD.encode(encode_recipe(recipe))
}

/// Decodes a base64 share string back into a payload.
pub fn decode_share_string(encoded: &str) -> Result<SharePayload, ShareError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| ShareError::Format(format!("not base64: {}", e)))?;
    let text =
        String::from_utf8(bytes).map_err(|e| ShareError::Format(format!("not UTF-8: {}", e)))?;
    decode(&text)
}
