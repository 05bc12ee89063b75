//! Recipe model.
//!
//! Field names serialize in camelCase to stay byte-compatible with recipe
//! JSON exported by other catalog tools, so import/export and QR payloads
//! round-trip without a translation layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::params::{
    ColorChromeEffect, DynamicRange, FilmSimulation, GrainEffect, SensorType, WhiteBalanceType,
};

/// A named set of imaging parameters for one camera sensor generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub author: String,
    pub sensor: SensorType,
    pub simulation: FilmSimulation,
    #[serde(default)]
    pub grain: GrainEffect,
    #[serde(default)]
    pub color_chrome_effect: ColorChromeEffect,
    #[serde(default, rename = "colorChromeFXBlue")]
    pub color_chrome_fx_blue: ColorChromeEffect,
    pub white_balance: WhiteBalanceType,
    #[serde(default)]
    pub wb_shift_r: i32,
    #[serde(default)]
    pub wb_shift_b: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kelvin: Option<u32>,
    pub dynamic_range: DynamicRange,
    #[serde(default)]
    pub highlight: i32,
    #[serde(default)]
    pub shadow: i32,
    #[serde(default)]
    pub color: i32,
    #[serde(default)]
    pub sharpness: i32,
    #[serde(default)]
    pub noise_reduction: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity: Option<i32>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_compensation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_notes: Option<String>,
}

impl Recipe {
    /// Creates a recipe with a fresh id and neutral parameter values.
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        sensor: SensorType,
        simulation: FilmSimulation,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            author: author.into(),
            sensor,
            simulation,
            grain: GrainEffect::Off,
            color_chrome_effect: ColorChromeEffect::Off,
            color_chrome_fx_blue: ColorChromeEffect::Off,
            white_balance: WhiteBalanceType::Auto,
            wb_shift_r: 0,
            wb_shift_b: 0,
            kelvin: None,
            dynamic_range: DynamicRange::Dr100,
            highlight: 0,
            shadow: 0,
            color: 0,
            sharpness: 0,
            noise_reduction: 0,
            clarity: None,
            is_favorite: false,
            tags: None,
            image_url: None,
            iso: None,
            exposure_compensation: None,
            personal_rating: None,
            personal_notes: None,
        }
    }

    pub fn with_white_balance(mut self, wb: WhiteBalanceType, shift_r: i32, shift_b: i32) -> Self {
        self.white_balance = wb;
        self.wb_shift_r = shift_r;
        self.wb_shift_b = shift_b;
        self
    }

    pub fn with_dynamic_range(mut self, dr: DynamicRange) -> Self {
        self.dynamic_range = dr;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = if tags.is_empty() { None } else { Some(tags) };
        self
    }

    /// Copy of this recipe without the image reference, for size-limited
    /// share payloads.
    pub fn without_image(&self) -> Self {
        let mut stripped = self.clone();
        stripped.image_url = None;
        stripped
    }
}

/// A fresh opaque id for imported recipes. Inbound ids are never reused so
/// they cannot collide with ids minted locally later.
pub fn imported_id() -> String {
    format!("imported-{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}

fn signed(v: i32) -> String {
    if v > 0 {
        format!("+{}", v)
    } else {
        v.to_string()
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Sensor: {}", self.sensor)?;
        writeln!(f, "Film Simulation: {}", self.simulation)?;
        writeln!(f, "Dynamic Range: {}", self.dynamic_range)?;
        match self.kelvin {
            Some(k) => writeln!(f, "White Balance: {} ({}K)", self.white_balance, k)?,
            None => writeln!(f, "White Balance: {}", self.white_balance)?,
        }
        writeln!(
            f,
            "WB Shift: R{} / B{}",
            signed(self.wb_shift_r),
            signed(self.wb_shift_b)
        )?;
        writeln!(f, "Highlight: {}", signed(self.highlight))?;
        writeln!(f, "Shadow: {}", signed(self.shadow))?;
        writeln!(f, "Color: {}", signed(self.color))?;
        writeln!(f, "Sharpness: {}", signed(self.sharpness))?;
        writeln!(f, "Noise Reduction: {}", signed(self.noise_reduction))?;
        if let Some(clarity) = self.clarity {
            writeln!(f, "Clarity: {}", signed(clarity))?;
        }
        writeln!(f, "Grain: {}", self.grain)?;
        writeln!(f, "Color Chrome Effect: {}", self.color_chrome_effect)?;
        writeln!(f, "Color Chrome FX Blue: {}", self.color_chrome_fx_blue)?;
        if let Some(iso) = &self.iso {
            writeln!(f, "ISO: {}", iso)?;
        }
        if let Some(ec) = &self.exposure_compensation {
            writeln!(f, "Exposure Comp: {}", ec)?;
        }
        if let Some(tags) = &self.tags {
            if !tags.is_empty() {
                writeln!(f, "Tags: {}", tags.join(", "))?;
            }
        }
        if let Some(desc) = &self.description {
            writeln!(f, "\n{}", desc)?;
        }
        writeln!(f, "Created by: {}", self.author)?;
        if self.is_favorite {
            writeln!(f, "Favorite")?;
        }
        Ok(())
    }
}

/// Partial field update applied by `RecipeStore::update`. Unset fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub simulation: Option<FilmSimulation>,
    pub grain: Option<GrainEffect>,
    pub color_chrome_effect: Option<ColorChromeEffect>,
    pub color_chrome_fx_blue: Option<ColorChromeEffect>,
    pub white_balance: Option<WhiteBalanceType>,
    pub wb_shift_r: Option<i32>,
    pub wb_shift_b: Option<i32>,
    pub kelvin: Option<u32>,
    pub dynamic_range: Option<DynamicRange>,
    pub highlight: Option<i32>,
    pub shadow: Option<i32>,
    pub color: Option<i32>,
    pub sharpness: Option<i32>,
    pub noise_reduction: Option<i32>,
    pub clarity: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub iso: Option<String>,
    pub exposure_compensation: Option<String>,
}

impl RecipeUpdate {
    /// Merges the set fields into `recipe`.
    pub fn apply(&self, recipe: &mut Recipe) {
        if let Some(name) = &self.name {
            recipe.name = name.clone();
        }
        if let Some(description) = &self.description {
            recipe.description = Some(description.clone());
        }
        if let Some(simulation) = self.simulation {
            recipe.simulation = simulation;
        }
        if let Some(grain) = self.grain {
            recipe.grain = grain;
        }
        if let Some(cce) = self.color_chrome_effect {
            recipe.color_chrome_effect = cce;
        }
        if let Some(ccb) = self.color_chrome_fx_blue {
            recipe.color_chrome_fx_blue = ccb;
        }
        if let Some(wb) = self.white_balance {
            recipe.white_balance = wb;
        }
        if let Some(r) = self.wb_shift_r {
            recipe.wb_shift_r = r;
        }
        if let Some(b) = self.wb_shift_b {
            recipe.wb_shift_b = b;
        }
        if let Some(kelvin) = self.kelvin {
            recipe.kelvin = Some(kelvin);
        }
        if let Some(dr) = self.dynamic_range {
            recipe.dynamic_range = dr;
        }
        if let Some(v) = self.highlight {
            recipe.highlight = v;
        }
        if let Some(v) = self.shadow {
            recipe.shadow = v;
        }
        if let Some(v) = self.color {
            recipe.color = v;
        }
        if let Some(v) = self.sharpness {
            recipe.sharpness = v;
        }
        if let Some(v) = self.noise_reduction {
            recipe.noise_reduction = v;
        }
        if let Some(v) = self.clarity {
            recipe.clarity = Some(v);
        }
        if let Some(tags) = &self.tags {
            recipe.tags = Some(tags.clone());
        }
        if let Some(url) = &self.image_url {
            recipe.image_url = Some(url.clone());
        }
        if let Some(iso) = &self.iso {
            recipe.iso = Some(iso.clone());
        }
        if let Some(ec) = &self.exposure_compensation {
            recipe.exposure_compensation = Some(ec.clone());
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.simulation.is_none()
            && self.grain.is_none()
            && self.color_chrome_effect.is_none()
            && self.color_chrome_fx_blue.is_none()
            && self.white_balance.is_none()
            && self.wb_shift_r.is_none()
            && self.wb_shift_b.is_none()
            && self.kelvin.is_none()
            && self.dynamic_range.is_none()
            && self.highlight.is_none()
            && self.shadow.is_none()
            && self.color.is_none()
            && self.sharpness.is_none()
            && self.noise_reduction.is_none()
            && self.clarity.is_none()
            && self.tags.is_none()
            && self.image_url.is_none()
            && self.iso.is_none()
            && self.exposure_compensation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_new_has_fresh_id() {
        let a = Recipe::new("A", "me", SensorType::XTransV, FilmSimulation::Provia);
        let b = Recipe::new("B", "me", SensorType::XTransV, FilmSimulation::Provia);
        assert_ne!(a.id, b.id);
        assert!(!a.is_favorite);
        assert_eq!(a.white_balance, WhiteBalanceType::Auto);
    }

    #[test]
    fn test_recipe_json_uses_camel_case() {
        let recipe = Recipe::new(
            "Test",
            "me",
            SensorType::XTransIV,
            FilmSimulation::ClassicChrome,
        )
        .with_white_balance(WhiteBalanceType::Daylight, 2, -3);

        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["wbShiftR"], 2);
        assert_eq!(json["wbShiftB"], -3);
        assert_eq!(json["dynamicRange"], "DR100");
        assert_eq!(json["simulation"], "Classic Chrome");
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("colorChromeFXBlue").is_some());
    }

    #[test]
    fn test_recipe_deserializes_with_minimal_fields() {
        // Only the structurally required fields; everything else defaults.
        let json = r#"{
            "id": "x",
            "name": "Minimal",
            "sensor": "X-Trans V",
            "simulation": "Provia/Standard",
            "dynamicRange": "DR100",
            "whiteBalance": "Auto"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.author, "");
        assert_eq!(recipe.grain, GrainEffect::Off);
        assert_eq!(recipe.highlight, 0);
        assert!(!recipe.is_favorite);
    }

    #[test]
    fn test_recipe_missing_required_field_fails() {
        let json = r#"{"id": "x", "name": "Broken", "sensor": "X-Trans V"}"#;
        assert!(serde_json::from_str::<Recipe>(json).is_err());
    }

    #[test]
    fn test_without_image_strips_only_image() {
        let mut recipe = Recipe::new("Img", "me", SensorType::Gfx, FilmSimulation::Astia);
        recipe.image_url = Some("https://example.com/a.jpg".to_string());

        let stripped = recipe.without_image();
        assert!(stripped.image_url.is_none());
        assert_eq!(stripped.name, recipe.name);
        assert_eq!(stripped.id, recipe.id);
    }

    #[test]
    fn test_update_apply_merges_fields() {
        let mut recipe = Recipe::new("Base", "me", SensorType::XTransV, FilmSimulation::Provia);
        let update = RecipeUpdate {
            highlight: Some(2),
            grain: Some(GrainEffect::WeakLarge),
            ..Default::default()
        };
        update.apply(&mut recipe);

        assert_eq!(recipe.highlight, 2);
        assert_eq!(recipe.grain, GrainEffect::WeakLarge);
        assert_eq!(recipe.simulation, FilmSimulation::Provia);
    }

    #[test]
    fn test_display_includes_signed_values() {
        let recipe = Recipe::new("Card", "me", SensorType::XTransV, FilmSimulation::Velvia)
            .with_white_balance(WhiteBalanceType::Shade, 3, -2);
        let text = recipe.to_string();
        assert!(text.contains("WB Shift: R+3 / B-2"));
        assert!(text.contains("Film Simulation: Velvia/Vivid"));
    }

    #[test]
    fn test_imported_id_prefix() {
        let id = imported_id();
        assert!(id.starts_with("imported-"));
        assert_ne!(imported_id(), imported_id());
    }
}
