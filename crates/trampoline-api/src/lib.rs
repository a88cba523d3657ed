//! Host API: value types, the plugin lifecycle trait, and the world access
//! trait that a server implements for void-fall handling.
//!
//! This crate has no dependency on any concrete server. Hosts implement
//! [`ServerApi`]; behaviour plugs in through [`Plugin`].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

// ─── Positions ───────────────────────────────────────────────────────────────

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn above(self) -> Self {
        self.offset(0, 1, 0)
    }
}

/// A point in a named world. `y` is the feet position.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f32, y: f32, z: f32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Location of the minimum corner of a block.
    pub fn of_block(world: impl Into<String>, pos: BlockPos) -> Self {
        Self::new(world, pos.x as f32, pos.y as f32, pos.z as f32)
    }

    pub fn block_x(&self) -> i32 {
        self.x.floor() as i32
    }

    pub fn block_y(&self) -> i32 {
        self.y.floor() as i32
    }

    pub fn block_z(&self) -> i32 {
        self.z.floor() as i32
    }

    /// The block containing this location.
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(self.block_x(), self.block_y(), self.block_z())
    }
}

// ─── Blocks ──────────────────────────────────────────────────────────────────

/// Coarse block material, as much as void-fall handling needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    Air,
    /// Any position outside the world's vertical range.
    VoidAir,
    Water,
    Lava,
    /// Non-colliding decoration: grass, flowers, torches.
    Plant,
    Solid,
}

impl Material {
    /// Whether an entity can occupy the block.
    pub fn is_passable(self) -> bool {
        !matches!(self, Material::Solid)
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, Material::Water | Material::Lava)
    }
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// Error returned when parsing an unknown entity kind or effect name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {category} \"{name}\"")]
pub struct UnknownName {
    pub category: &'static str,
    pub name: String,
}

/// Strip an optional `minecraft:` namespace and lowercase.
fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_prefix("minecraft:") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $category:literal {
            $($variant:ident => $id:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Short lowercase name without namespace, e.g. `"cow"`.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $id),*
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = normalize_name(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.name() == normalized)
                    .ok_or_else(|| UnknownName {
                        category: $category,
                        name: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum! {
    /// Entity type. Parsed case-insensitively, with or without the
    /// `minecraft:` namespace.
    EntityKind, "entity kind" {
        Player => "player",
        Item => "item",
        ExperienceOrb => "experience_orb",
        Arrow => "arrow",
        FallingBlock => "falling_block",
        Tnt => "tnt",
        Minecart => "minecart",
        Boat => "boat",
        ArmorStand => "armor_stand",
        Zombie => "zombie",
        Skeleton => "skeleton",
        Creeper => "creeper",
        Spider => "spider",
        Enderman => "enderman",
        Shulker => "shulker",
        Cow => "cow",
        Pig => "pig",
        Sheep => "sheep",
        Chicken => "chicken",
        Horse => "horse",
        Wolf => "wolf",
        Villager => "villager",
        IronGolem => "iron_golem",
    }
}

named_enum! {
    /// Status effect type.
    EffectKind, "effect" {
        Speed => "speed",
        Slowness => "slowness",
        Haste => "haste",
        MiningFatigue => "mining_fatigue",
        Strength => "strength",
        InstantHealth => "instant_health",
        InstantDamage => "instant_damage",
        JumpBoost => "jump_boost",
        Nausea => "nausea",
        Regeneration => "regeneration",
        Resistance => "resistance",
        FireResistance => "fire_resistance",
        WaterBreathing => "water_breathing",
        Invisibility => "invisibility",
        Blindness => "blindness",
        NightVision => "night_vision",
        Hunger => "hunger",
        Weakness => "weakness",
        Poison => "poison",
        Wither => "wither",
        Absorption => "absorption",
        SlowFalling => "slow_falling",
    }
}

/// A status effect as authored in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub duration_ticks: i32,
    /// 0 = level I, 1 = level II, etc.
    pub amplifier: i32,
    pub show_particles: bool,
}

/// Player interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// Snapshot of an entity (player or mob), passed to plugins.
#[derive(Debug, Clone)]
pub struct PluginEntity {
    pub runtime_id: u64,
    pub uuid: String,
    /// Display name; for players, the player name.
    pub name: String,
    pub kind: EntityKind,
    pub location: Location,
    /// Only meaningful for players.
    pub gamemode: GameMode,
}

impl PluginEntity {
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }
}

// ─── Worlds ──────────────────────────────────────────────────────────────────

/// Square world border in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBorder {
    pub center_x: f64,
    pub center_z: f64,
    /// Full side length in blocks.
    pub size: f64,
}

/// Static facts about a loaded world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldInfo {
    pub name: String,
    /// Lowest buildable Y (inclusive).
    pub min_y: i32,
    /// Highest buildable Y (inclusive).
    pub max_y: i32,
    pub border: WorldBorder,
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// The Plugin trait: implemented by behaviour that runs inside a host.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to register commands, schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded. Pending tasks should be cancelled here.
    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        let _ = api;
    }

    /// Called when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Called when a plugin-registered command is executed. Return a response message.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        let _ = (command, args, sender, api);
        None
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config.
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Read/write access to world state, passed to plugins during callbacks.
///
/// Read methods return data immediately. Write methods are deferred (applied
/// after the plugin callback returns), so a callback observes one consistent
/// world state throughout.
pub trait ServerApi {
    // --- Entities ---
    fn online_players(&self) -> Vec<PluginEntity>;
    /// All entities currently in `world`, players included. No ordering guarantee.
    fn world_entities(&self, world: &str) -> Option<Vec<PluginEntity>>;

    // --- World ---
    fn world_info(&self, world: &str) -> Option<WorldInfo>;
    /// Y of the highest non-air block in the column, `None` if the column is empty.
    fn highest_block_y(&self, world: &str, x: i32, z: i32) -> Option<i32>;
    /// Material at `pos`. Positions outside the vertical range are `VoidAir`.
    fn block_at(&self, world: &str, pos: BlockPos) -> Material;
    fn current_tick(&self) -> u64;

    // --- Entity commands ---
    fn teleport_entity(&mut self, runtime_id: u64, destination: &Location);
    fn set_velocity(&mut self, runtime_id: u64, velocity: (f32, f32, f32));
    fn set_fall_distance(&mut self, runtime_id: u64, distance: f32);
    /// Apply an effect, replacing any active effect of the same kind.
    fn add_effect(&mut self, runtime_id: u64, effect: &StatusEffect);
    fn set_gamemode(&mut self, runtime_id: u64, gamemode: GameMode);
    fn send_message(&mut self, player_name: &str, message: &str);

    // --- Scheduler ---
    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32);
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
