mod backup;
mod device;
mod params;
mod recipe;

pub use backup::{Backup, BackupInfo};
pub use device::{Device, UserSettings};
pub use params::{
    ColorChromeEffect, DynamicRange, FilmSimulation, GrainEffect, SensorType, WhiteBalanceType,
};
pub use recipe::{imported_id, Recipe, RecipeUpdate};
