use clap::{Args, Subcommand};

use super::{confirm, load_session, persist_session, try_auto_push, OutputFormat};
use crate::config::Config;
use crate::models::{
    ColorChromeEffect, DynamicRange, FilmSimulation, GrainEffect, Recipe, RecipeUpdate,
    SensorType, WhiteBalanceType,
};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a new recipe
    Add {
        /// Name of the recipe
        name: String,

        /// Film simulation (e.g. "classic-chrome")
        #[arg(long)]
        simulation: FilmSimulation,

        /// Sensor generation; defaults to the selected device's sensor
        #[arg(long)]
        sensor: Option<SensorType>,

        /// Dynamic range (dr100, dr200, dr400, auto)
        #[arg(long)]
        dynamic_range: Option<DynamicRange>,

        /// White balance mode
        #[arg(long)]
        white_balance: Option<WhiteBalanceType>,

        /// White balance red shift (-9..=9)
        #[arg(long, default_value_t = 0)]
        wb_shift_r: i32,

        /// White balance blue shift (-9..=9)
        #[arg(long, default_value_t = 0)]
        wb_shift_b: i32,

        /// Kelvin temperature, for the kelvin white balance mode
        #[arg(long)]
        kelvin: Option<u32>,

        /// Grain effect
        #[arg(long)]
        grain: Option<GrainEffect>,

        /// Color chrome effect
        #[arg(long)]
        color_chrome: Option<ColorChromeEffect>,

        /// Color chrome FX blue
        #[arg(long)]
        fx_blue: Option<ColorChromeEffect>,

        /// Highlight tone (-2..=4)
        #[arg(long)]
        highlight: Option<i32>,

        /// Shadow tone (-2..=4)
        #[arg(long)]
        shadow: Option<i32>,

        /// Color saturation (-4..=4)
        #[arg(long)]
        color: Option<i32>,

        /// Sharpness (-4..=4)
        #[arg(long)]
        sharpness: Option<i32>,

        /// Noise reduction (-4..=4)
        #[arg(long)]
        noise_reduction: Option<i32>,

        /// Clarity (-5..=5)
        #[arg(long)]
        clarity: Option<i32>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Suggested ISO (free text, e.g. "Auto up to 6400")
        #[arg(long)]
        iso: Option<String>,

        /// Suggested exposure compensation (free text)
        #[arg(long)]
        exposure: Option<String>,

        /// Image URL
        #[arg(long)]
        image_url: Option<String>,
    },

    /// List recipes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only favorites
        #[arg(long)]
        favorites: bool,

        /// Filter by tag
        #[arg(long = "tag", value_name = "TAG")]
        tag: Option<String>,

        /// Filter by film simulation
        #[arg(long)]
        simulation: Option<FilmSimulation>,
    },

    /// Show a recipe's full settings card
    Show {
        /// Recipe ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing recipe
    Update {
        /// Recipe ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Film simulation
        #[arg(long)]
        simulation: Option<FilmSimulation>,

        /// Dynamic range
        #[arg(long)]
        dynamic_range: Option<DynamicRange>,

        /// White balance mode
        #[arg(long)]
        white_balance: Option<WhiteBalanceType>,

        /// White balance red shift (-9..=9)
        #[arg(long)]
        wb_shift_r: Option<i32>,

        /// White balance blue shift (-9..=9)
        #[arg(long)]
        wb_shift_b: Option<i32>,

        /// Kelvin temperature
        #[arg(long)]
        kelvin: Option<u32>,

        /// Grain effect
        #[arg(long)]
        grain: Option<GrainEffect>,

        /// Color chrome effect
        #[arg(long)]
        color_chrome: Option<ColorChromeEffect>,

        /// Color chrome FX blue
        #[arg(long)]
        fx_blue: Option<ColorChromeEffect>,

        /// Highlight tone (-2..=4)
        #[arg(long)]
        highlight: Option<i32>,

        /// Shadow tone (-2..=4)
        #[arg(long)]
        shadow: Option<i32>,

        /// Color saturation (-4..=4)
        #[arg(long)]
        color: Option<i32>,

        /// Sharpness (-4..=4)
        #[arg(long)]
        sharpness: Option<i32>,

        /// Noise reduction (-4..=4)
        #[arg(long)]
        noise_reduction: Option<i32>,

        /// Clarity (-5..=5)
        #[arg(long)]
        clarity: Option<i32>,

        /// Replace tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Suggested ISO
        #[arg(long)]
        iso: Option<String>,

        /// Suggested exposure compensation
        #[arg(long)]
        exposure: Option<String>,

        /// Image URL
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a recipe
    Delete {
        /// Recipe ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Toggle a recipe's favorite flag
    Favorite {
        /// Recipe ID or name
        identifier: String,
    },

    /// Rate a recipe (0 clears the rating and notes)
    Rate {
        /// Recipe ID or name
        identifier: String,

        /// Rating 0..=5
        rating: u8,

        /// Personal notes to store with the rating
        #[arg(long)]
        notes: Option<String>,
    },
}

impl RecipeCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (local, mut store) = load_session(config);

        match &self.command {
            RecipeSubcommand::Add {
                name,
                simulation,
                sensor,
                dynamic_range,
                white_balance,
                wb_shift_r,
                wb_shift_b,
                kelvin,
                grain,
                color_chrome,
                fx_blue,
                highlight,
                shadow,
                color,
                sharpness,
                noise_reduction,
                clarity,
                description,
                tags,
                iso,
                exposure,
                image_url,
            } => {
                if name.trim().is_empty() {
                    return Err("Recipe name cannot be empty".into());
                }

                let sensor = sensor.unwrap_or(store.settings().device.sensor);
                let mut recipe = Recipe::new(name.trim(), &config.author, sensor, *simulation);

                recipe.wb_shift_r = *wb_shift_r;
                recipe.wb_shift_b = *wb_shift_b;
                if let Some(wb) = white_balance {
                    recipe.white_balance = *wb;
                }
                recipe.kelvin = *kelvin;
                if let Some(dr) = dynamic_range {
                    recipe.dynamic_range = *dr;
                }
                if let Some(grain) = grain {
                    recipe.grain = *grain;
                }
                if let Some(cce) = color_chrome {
                    recipe.color_chrome_effect = *cce;
                }
                if let Some(ccb) = fx_blue {
                    recipe.color_chrome_fx_blue = *ccb;
                }
                recipe.highlight = highlight.unwrap_or(0);
                recipe.shadow = shadow.unwrap_or(0);
                recipe.color = color.unwrap_or(0);
                recipe.sharpness = sharpness.unwrap_or(0);
                recipe.noise_reduction = noise_reduction.unwrap_or(0);
                recipe.clarity = *clarity;
                recipe.description = description.clone();
                recipe = recipe.with_tags(tags.clone());
                recipe.iso = iso.clone();
                recipe.exposure_compensation = exposure.clone();
                recipe.image_url = image_url.clone();

                store.add(recipe)?;
                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Created recipe:");
                println!("{}", store.recipes()[0]);
                Ok(())
            }

            RecipeSubcommand::List {
                format,
                favorites,
                tag,
                simulation,
            } => {
                let recipes: Vec<&Recipe> = store
                    .recipes()
                    .iter()
                    .filter(|r| !favorites || r.is_favorite)
                    .filter(|r| {
                        tag.as_ref().map_or(true, |tag| {
                            r.tags.as_ref().map_or(false, |tags| {
                                tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
                            })
                        })
                    })
                    .filter(|r| simulation.map_or(true, |s| r.simulation == s))
                    .collect();

                if recipes.is_empty() {
                    println!("No recipes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<30}  {:<22}  {:<12}  FAV", "NAME", "SIMULATION", "SENSOR");
                        println!("{}", "-".repeat(72));
                        for recipe in &recipes {
                            let name = truncated(&recipe.name, 30);
                            println!(
                                "{:<30}  {:<22}  {:<12}  {}",
                                name,
                                recipe.simulation.to_string(),
                                recipe.sensor.to_string(),
                                if recipe.is_favorite { "*" } else { "" }
                            );
                        }
                        println!("\nTotal: {} recipe(s)", recipes.len());
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Show { identifier, format } => {
                let recipe = store
                    .find(identifier)
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(recipe)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", recipe);
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Update {
                identifier,
                name,
                description,
                simulation,
                dynamic_range,
                white_balance,
                wb_shift_r,
                wb_shift_b,
                kelvin,
                grain,
                color_chrome,
                fx_blue,
                highlight,
                shadow,
                color,
                sharpness,
                noise_reduction,
                clarity,
                tags,
                iso,
                exposure,
                image_url,
            } => {
                let update = RecipeUpdate {
                    name: name.clone(),
                    description: description.clone(),
                    simulation: *simulation,
                    grain: *grain,
                    color_chrome_effect: *color_chrome,
                    color_chrome_fx_blue: *fx_blue,
                    white_balance: *white_balance,
                    wb_shift_r: *wb_shift_r,
                    wb_shift_b: *wb_shift_b,
                    kelvin: *kelvin,
                    dynamic_range: *dynamic_range,
                    highlight: *highlight,
                    shadow: *shadow,
                    color: *color,
                    sharpness: *sharpness,
                    noise_reduction: *noise_reduction,
                    clarity: *clarity,
                    tags: if tags.is_empty() {
                        None
                    } else {
                        Some(tags.clone())
                    },
                    image_url: image_url.clone(),
                    iso: iso.clone(),
                    exposure_compensation: exposure.clone(),
                };
                if update.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let id = store
                    .find(identifier)
                    .map(|r| r.id.clone())
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                store.update(&id, &update);

                let updated = store.get(&id).expect("recipe still present after update");
                crate::store::validate_bounds(updated)?;

                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Updated recipe:");
                println!("{}", store.get(&id).unwrap());
                Ok(())
            }

            RecipeSubcommand::Delete { identifier, force } => {
                let recipe = store
                    .find(identifier)
                    .cloned()
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;

                if !force && !confirm(&format!("Delete recipe '{}'?", recipe.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                let remaining: Vec<Recipe> = store
                    .recipes()
                    .iter()
                    .filter(|r| r.id != recipe.id)
                    .cloned()
                    .collect();
                store.replace_all(remaining);

                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                println!("Deleted recipe: {}", recipe.name);
                Ok(())
            }

            RecipeSubcommand::Favorite { identifier } => {
                let id = store
                    .find(identifier)
                    .map(|r| r.id.clone())
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                store.toggle_favorite(&id);

                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                let recipe = store.get(&id).unwrap();
                if recipe.is_favorite {
                    println!("Marked '{}' as favorite", recipe.name);
                } else {
                    println!("Removed '{}' from favorites", recipe.name);
                }
                Ok(())
            }

            RecipeSubcommand::Rate {
                identifier,
                rating,
                notes,
            } => {
                let id = store
                    .find(identifier)
                    .map(|r| r.id.clone())
                    .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
                store.set_rating(&id, *rating, notes.clone())?;

                persist_session(&local, &store);
                try_auto_push(config, &store).await;

                let recipe = store.get(&id).unwrap();
                if *rating == 0 {
                    println!("Cleared rating for '{}'", recipe.name);
                } else {
                    println!("Rated '{}' {}/5", recipe.name, rating);
                }
                Ok(())
            }
        }
    }
}

/// Shortens a name to at most `max` characters for table display. Counts
/// characters, not bytes, so names with accents never split mid-character.
fn truncated(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let head: String = name.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
