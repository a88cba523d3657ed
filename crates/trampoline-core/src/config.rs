//! Configuration: the declarative file schema, validation into the active
//! relocation state, and the handle through which that state is published.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use trampoline_api::BlockPos;

use crate::destination::DestinationWorld;
use crate::error::ConfigError;
use crate::exclusion::ExclusionZone;
use crate::policy::RelocationPolicy;

// ─── File schema ─────────────────────────────────────────────────────────────

/// Top-level configuration as written in `config.toml` / `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrampolineConfig {
    /// Period in ticks between checks of player locations.
    #[serde(default = "default_check_ticks")]
    pub check_ticks: i64,
    /// Y at or below which status effects are applied.
    #[serde(default = "default_effect_y")]
    pub effect_y: i32,
    /// Y at or below which players are relocated.
    #[serde(default = "default_teleport_y")]
    pub teleport_y: i32,
    /// Y at or below which swept non-player entities are relocated.
    #[serde(default = "default_teleport_y")]
    pub entity_teleport_y: i32,
    /// Minimum distance from the world border for sky destinations.
    #[serde(default = "default_world_border_buffer")]
    pub world_border_buffer: i32,
    /// Source world name → what happens when leaving it through the void.
    #[serde(default)]
    pub exit: BTreeMap<String, ExitSection>,
    /// Destination world name → how entities may enter it.
    #[serde(default)]
    pub enter: BTreeMap<String, EnterSection>,
}

fn default_check_ticks() -> i64 {
    10
}

fn default_effect_y() -> i32 {
    -80
}

fn default_teleport_y() -> i32 {
    -100
}

fn default_world_border_buffer() -> i32 {
    10
}

impl Default for TrampolineConfig {
    fn default() -> Self {
        Self {
            check_ticks: default_check_ticks(),
            effect_y: default_effect_y(),
            teleport_y: default_teleport_y(),
            entity_teleport_y: default_teleport_y(),
            world_border_buffer: default_world_border_buffer(),
            exit: BTreeMap::new(),
            enter: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExitSection {
    #[serde(default)]
    pub enabled: bool,
    /// `"sky"` or `"surface"`.
    pub send_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sky: Option<SkySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkySection {
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub effects: Vec<EffectSection>,
    #[serde(default)]
    pub teleport_mobs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EffectSection {
    #[serde(rename = "type")]
    pub kind: String,
    /// Duration in ticks.
    pub duration: i32,
    #[serde(default)]
    pub amplifier: i32,
    #[serde(default = "default_particles")]
    pub particles: bool,
}

fn default_particles() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SurfaceSection {
    #[serde(default)]
    pub safe_scan: Option<SafeScanSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SafeScanSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub step: i32,
    #[serde(default)]
    pub tries: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnterSection {
    pub fail_safe_location: PointSection,
    #[serde(default)]
    pub exclusion_zones: Vec<ZoneSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSection {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSection {
    pub x: i32,
    pub z: i32,
    pub radius: i32,
}

impl TrampolineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Load from disk. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&contents)?)
        } else {
            Self::from_toml_str(&contents)
        }
    }
}

// ─── Active state ────────────────────────────────────────────────────────────

/// Process-wide vertical thresholds. Read-only for the duration of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Always `>= 1`.
    pub check_ticks: u64,
    pub effect_y: i32,
    pub teleport_y: i32,
    pub entity_teleport_y: i32,
    pub world_border_buffer: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_config(&TrampolineConfig::default())
    }
}

impl Thresholds {
    fn from_config(config: &TrampolineConfig) -> Self {
        Self {
            check_ticks: config.check_ticks.max(1) as u64,
            effect_y: config.effect_y,
            teleport_y: config.teleport_y,
            entity_teleport_y: config.entity_teleport_y,
            world_border_buffer: config.world_border_buffer,
        }
    }
}

/// One configuration epoch: thresholds, the relocation policy for each source
/// world and the profile of each destination world. Never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct ActiveConfig {
    pub thresholds: Thresholds,
    pub policies: BTreeMap<String, RelocationPolicy>,
    pub destinations: BTreeMap<String, DestinationWorld>,
}

impl ActiveConfig {
    pub fn new(
        thresholds: Thresholds,
        policies: BTreeMap<String, RelocationPolicy>,
        destinations: BTreeMap<String, DestinationWorld>,
    ) -> Self {
        Self {
            thresholds,
            policies,
            destinations,
        }
    }

    /// Validate a parsed file. Invalid entries are excluded and returned as
    /// issues; everything else is kept.
    pub fn build(config: &TrampolineConfig) -> (Self, Vec<ConfigError>) {
        let mut issues = Vec::new();

        let mut policies = BTreeMap::new();
        for (world, section) in &config.exit {
            match RelocationPolicy::load(world, section, &mut issues) {
                Ok(policy) => {
                    policies.insert(world.clone(), policy);
                }
                Err(e) => issues.push(e),
            }
        }

        let mut destinations = BTreeMap::new();
        for (world, section) in &config.enter {
            let point = section.fail_safe_location;
            let zones = section
                .exclusion_zones
                .iter()
                .map(|z| ExclusionZone::new(z.x, z.z, z.radius));
            let (destination, zone_issues) =
                DestinationWorld::load(world, BlockPos::new(point.x, point.y, point.z), zones);
            issues.extend(zone_issues);
            destinations.insert(world.clone(), destination);
        }

        (
            Self::new(Thresholds::from_config(config), policies, destinations),
            issues,
        )
    }

    /// The enabled policy for `world`, if any.
    pub fn enabled_policy(&self, world: &str) -> Option<&RelocationPolicy> {
        self.policies.get(world).filter(|p| p.is_enabled())
    }

    /// Log every setting at info level.
    pub fn log_summary(&self) {
        let t = &self.thresholds;
        info!("CHECK_TICKS: {}", t.check_ticks);
        info!("EFFECT_Y: {}", t.effect_y);
        info!("TELEPORT_Y: {}", t.teleport_y);
        info!("ENTITY_TELEPORT_Y: {}", t.entity_teleport_y);
        info!("WORLD_BORDER_BUFFER: {}", t.world_border_buffer);
        for (world, policy) in &self.policies {
            info!("Leaving {world}, {}", policy.describe());
        }
        for (world, destination) in &self.destinations {
            info!("Entering {world},{}", destination.describe());
        }
    }
}

// ─── Publication ─────────────────────────────────────────────────────────────

/// Shared reference to the current [`ActiveConfig`].
///
/// Readers take one [`snapshot`](Self::snapshot) per scan and use it for the
/// whole cycle; [`publish`](Self::publish) swaps the reference wholesale, so
/// a reader never sees a partly updated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<ActiveConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: ActiveConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn snapshot(&self) -> Arc<ActiveConfig> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn publish(&self, config: ActiveConfig) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(config);
    }

    /// Replace thresholds, policies and destination profiles in one step.
    pub fn reload(
        &self,
        thresholds: Thresholds,
        policies: BTreeMap<String, RelocationPolicy>,
        destinations: BTreeMap<String, DestinationWorld>,
    ) {
        self.publish(ActiveConfig::new(thresholds, policies, destinations));
    }

    /// Build from a parsed file, log excluded entries, publish, and return
    /// the number of excluded entries.
    pub fn apply(&self, config: &TrampolineConfig, logged: bool) -> usize {
        let (active, issues) = ActiveConfig::build(config);
        for issue in &issues {
            error!("{issue}");
        }
        if logged {
            active.log_summary();
        }
        self.publish(active);
        issues.len()
    }
}
