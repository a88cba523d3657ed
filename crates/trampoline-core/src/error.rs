//! Configuration and relocation errors.

use thiserror::Error;

/// Problems found while loading configuration.
///
/// `Io` and `Parse` reject a whole reload. Every other variant excludes only
/// the offending entry and is reported alongside the configuration that was
/// still built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("unsupported send-to action \"{kind}\" for world \"{world}\"")]
    UnknownPolicyKind { world: String, kind: String },

    #[error("{world} sends to unspecified world")]
    MissingDestinationWorld { world: String },

    #[error("{world} sends to invalid Y coordinate, {y}")]
    InvalidDestinationY { world: String, y: i32 },

    #[error("{world}: invalid entity type for teleportation: {name}")]
    InvalidEntityKind { world: String, name: String },

    #[error("{world}: invalid status effect: {reason}")]
    InvalidEffect { world: String, reason: String },

    #[error("{world}: exclusion zone at ({x},{z}) has negative radius {radius}")]
    NegativeRadius {
        world: String,
        x: i32,
        z: i32,
        radius: i32,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// A single relocation attempt that could not be carried out. The entity is
/// left where it is and re-evaluated on the next scan cycle.
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("can't send {entity} to {world}: no destination profile for that world")]
    MissingDestinationProfile { entity: String, world: String },

    #[error("can't send {entity} to non-existent world {world}")]
    MissingWorld { entity: String, world: String },

    #[error("source world {world} does not exist")]
    MissingSourceWorld { world: String },
}
