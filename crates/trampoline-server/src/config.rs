use serde::Deserialize;
use std::path::Path;
use trampoline_api::{GameMode, Material};

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub logging: LoggingSection,
    #[serde(default)]
    pub plugin: PluginSection,
    #[serde(default)]
    pub worlds: Vec<WorldSection>,
    #[serde(default)]
    pub entities: Vec<EntitySection>,
    /// Individual blocks placed over the generated terrain.
    #[serde(default)]
    pub blocks: Vec<BlockSection>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PluginSection {
    /// Trampoline configuration file. Re-read on `trampoline reload`.
    #[serde(default)]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
    Flat,
    Void,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorldSection {
    pub name: String,
    pub generator: Generator,
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    #[serde(default = "default_border_size")]
    pub border_size: f64,
    #[serde(default)]
    pub border_center_x: f64,
    #[serde(default)]
    pub border_center_z: f64,
}

fn default_min_y() -> i32 {
    -64
}

fn default_max_y() -> i32 {
    319
}

fn default_border_size() -> f64 {
    60_000_000.0
}

#[derive(Debug, Deserialize)]
pub struct EntitySection {
    pub name: String,
    /// Entity type name, e.g. `player`, `cow`, `minecraft:zombie`.
    pub kind: String,
    pub world: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub gamemode: GameMode,
}

#[derive(Debug, Deserialize)]
pub struct BlockSection {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub material: Material,
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
