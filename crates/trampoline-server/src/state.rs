//! Live simulation state: worlds, entities and the tick counter.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use trampoline_api::{BlockPos, EntityKind, Location};

use crate::config::ServerConfig;
use crate::entity::SimEntity;
use crate::plugin_manager::PendingAction;
use crate::world::SimWorld;

pub struct ServerState {
    worlds: HashMap<String, SimWorld>,
    entities: Vec<SimEntity>,
    tick: u64,
    next_runtime_id: u64,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            worlds: HashMap::new(),
            entities: Vec::new(),
            tick: 0,
            next_runtime_id: 1,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut state = Self::new();
        for section in &config.worlds {
            state.add_world(SimWorld::from_config(section));
        }
        for block in &config.blocks {
            let world = state
                .worlds
                .get_mut(&block.world)
                .ok_or_else(|| format!("block placed in unknown world {}", block.world))?;
            world.set_block(BlockPos::new(block.x, block.y, block.z), block.material);
        }
        for section in &config.entities {
            if !state.worlds.contains_key(&section.world) {
                return Err(format!("{} is in unknown world {}", section.name, section.world).into());
            }
            let kind: EntityKind = section.kind.parse()?;
            let id = state.spawn(
                &section.name,
                kind,
                Location::new(section.world.clone(), section.x, section.y, section.z),
            );
            if let Some(entity) = state.entity_mut(id) {
                entity.gamemode = section.gamemode;
            }
        }
        Ok(state)
    }

    pub fn add_world(&mut self, world: SimWorld) {
        self.worlds.insert(world.name().to_string(), world);
    }

    /// Add an entity and return its runtime id.
    pub fn spawn(&mut self, name: &str, kind: EntityKind, location: Location) -> u64 {
        let id = self.next_runtime_id;
        self.next_runtime_id += 1;
        self.entities.push(SimEntity::new(id, name, kind, location));
        id
    }

    pub fn world(&self, name: &str) -> Option<&SimWorld> {
        self.worlds.get(name)
    }

    pub fn world_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.worlds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn entities(&self) -> &[SimEntity] {
        &self.entities
    }

    pub fn entity_mut(&mut self, runtime_id: u64) -> Option<&mut SimEntity> {
        self.entities.iter_mut().find(|e| e.runtime_id == runtime_id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&SimEntity> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advance the tick counter and move every entity.
    pub fn game_tick(&mut self) {
        self.tick += 1;
        for entity in &mut self.entities {
            let Some(world) = self.worlds.get(&entity.location.world) else {
                continue;
            };
            if let Some(fallen) = entity.tick(world) {
                debug!(
                    "{} landed at y={:.1} after falling {fallen:.1} blocks",
                    entity.name, entity.location.y
                );
            }
        }
    }

    /// Apply world actions requested by plugins.
    pub fn apply_plugin_actions(&mut self, actions: Vec<PendingAction>) {
        for action in actions {
            match action {
                PendingAction::SendMessage {
                    player_name,
                    message,
                } => {
                    info!("[{player_name}] {}", strip_formatting(&message));
                }
                PendingAction::TeleportEntity {
                    runtime_id,
                    destination,
                } => {
                    if !self.worlds.contains_key(&destination.world) {
                        warn!("Teleport to unknown world {} ignored", destination.world);
                        continue;
                    }
                    if let Some(entity) = self.entity_mut(runtime_id) {
                        entity.teleport(destination);
                    }
                }
                PendingAction::SetVelocity {
                    runtime_id,
                    velocity,
                } => {
                    if let Some(entity) = self.entity_mut(runtime_id) {
                        entity.velocity = velocity;
                        entity.on_ground = false;
                    }
                }
                PendingAction::SetFallDistance {
                    runtime_id,
                    distance,
                } => {
                    if let Some(entity) = self.entity_mut(runtime_id) {
                        entity.fall_distance = distance;
                    }
                }
                PendingAction::AddEffect { runtime_id, effect } => {
                    if let Some(entity) = self.entity_mut(runtime_id) {
                        entity.add_effect(effect);
                    }
                }
                PendingAction::SetGamemode {
                    runtime_id,
                    gamemode,
                } => {
                    if let Some(entity) = self.entity_mut(runtime_id) {
                        entity.gamemode = gamemode;
                    }
                }
                // Scheduler and command actions never reach the world.
                PendingAction::RegisterCommand { .. }
                | PendingAction::ScheduleTask { .. }
                | PendingAction::CancelTask { .. } => {}
            }
        }
    }

    /// One line per entity.
    pub fn status(&self) -> String {
        let mut lines = vec![format!(
            "tick {} | worlds: {} | {} entities",
            self.tick,
            self.world_names().join(", "),
            self.entities.len()
        )];
        for e in &self.entities {
            lines.push(format!(
                "  #{} {} ({}) in {} at ({:.1}, {:.1}, {:.1}){}{}",
                e.runtime_id,
                e.name,
                e.kind,
                e.location.world,
                e.location.x,
                e.location.y,
                e.location.z,
                if e.is_player() {
                    format!(" {:?}", e.gamemode)
                } else {
                    String::new()
                },
                if e.on_ground { " on ground" } else { "" },
            ));
        }
        lines.join("\n")
    }

    /// Console `tp <entity> <world> <x> <y> <z>`.
    pub fn cmd_tp(&mut self, args: &[&str]) -> String {
        let [name, world, x, y, z] = args else {
            return "Usage: tp <entity> <world> <x> <y> <z>".into();
        };
        let (Ok(x), Ok(y), Ok(z)) = (x.parse::<f32>(), y.parse::<f32>(), z.parse::<f32>()) else {
            return "Coordinates must be numbers".into();
        };
        if !self.worlds.contains_key(*world) {
            return format!("Unknown world: {world}");
        }
        let Some(id) = self.entity_by_name(name).map(|e| e.runtime_id) else {
            return format!("Unknown entity: {name}");
        };
        if let Some(entity) = self.entity_mut(id) {
            entity.teleport(Location::new(*world, x, y, z));
            entity.velocity = (0.0, 0.0, 0.0);
            entity.fall_distance = 0.0;
        }
        format!("Teleported {name} to ({world}, {x:.1}, {y:.1}, {z:.1})")
    }
}

/// Drop `§x` formatting codes for console output.
fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{00A7}' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trampoline_api::{EffectKind, GameMode, StatusEffect};

    const SERVER_TOML: &str = r#"
        [logging]
        level = "info"

        [[worlds]]
        name = "world"
        generator = "flat"

        [[worlds]]
        name = "world_the_end"
        generator = "void"

        [[entities]]
        name = "Alice"
        kind = "player"
        world = "world_the_end"
        x = 0.5
        y = 64.0
        z = 0.5
        gamemode = "spectator"

        [[entities]]
        name = "Daisy"
        kind = "minecraft:cow"
        world = "world"
        x = 3.5
        y = -60.0
        z = 3.5

        [[blocks]]
        world = "world"
        x = 0
        y = -60
        z = 0
        material = "water"
    "#;

    fn state() -> ServerState {
        let config: ServerConfig = toml::from_str(SERVER_TOML).unwrap();
        ServerState::from_config(&config).unwrap()
    }

    #[test]
    fn builds_from_config() {
        let state = state();
        assert_eq!(state.world_names(), vec!["world", "world_the_end"]);
        assert_eq!(state.entities().len(), 2);
        let alice = state.entity_by_name("alice").unwrap();
        assert_eq!(alice.runtime_id, 1);
        assert_eq!(alice.gamemode, GameMode::Spectator);
        assert_eq!(state.entity_by_name("Daisy").unwrap().kind, EntityKind::Cow);
        assert_eq!(
            state.world("world").unwrap().highest_block_y(0, 0),
            Some(-60)
        );
    }

    #[test]
    fn unknown_kind_or_world_is_rejected() {
        let bad_kind = SERVER_TOML.replace("minecraft:cow", "dragon");
        let config: ServerConfig = toml::from_str(&bad_kind).unwrap();
        assert!(ServerState::from_config(&config).is_err());

        let bad_world = SERVER_TOML.replace("world = \"world_the_end\"", "world = \"nether\"");
        let config: ServerConfig = toml::from_str(&bad_world).unwrap();
        assert!(ServerState::from_config(&config).is_err());
    }

    #[test]
    fn applies_world_actions() {
        let mut state = state();
        state.apply_plugin_actions(vec![
            PendingAction::TeleportEntity {
                runtime_id: 1,
                destination: Location::new("world", 10.5, -59.0, 10.5),
            },
            PendingAction::SetGamemode {
                runtime_id: 1,
                gamemode: GameMode::Survival,
            },
            PendingAction::SetVelocity {
                runtime_id: 2,
                velocity: (0.0, 0.5, 0.0),
            },
            PendingAction::AddEffect {
                runtime_id: 2,
                effect: StatusEffect {
                    kind: EffectKind::Blindness,
                    duration_ticks: 40,
                    amplifier: 0,
                    show_particles: true,
                },
            },
            PendingAction::TeleportEntity {
                runtime_id: 2,
                destination: Location::new("nether", 0.0, 0.0, 0.0),
            },
        ]);
        let alice = state.entity_by_name("Alice").unwrap();
        assert_eq!(alice.location, Location::new("world", 10.5, -59.0, 10.5));
        assert_eq!(alice.gamemode, GameMode::Survival);
        let daisy = state.entity_by_name("Daisy").unwrap();
        assert_eq!(daisy.location.world, "world");
        assert_eq!(daisy.velocity, (0.0, 0.5, 0.0));
        assert!(daisy.has_effect(EffectKind::Blindness));
    }

    #[test]
    fn tick_moves_entities() {
        let mut state = state();
        state.cmd_tp(&["Daisy", "world", "5.5", "-50", "5.5"]);
        for _ in 0..40 {
            state.game_tick();
        }
        assert_eq!(state.current_tick(), 40);
        let daisy = state.entity_by_name("Daisy").unwrap();
        assert!(daisy.on_ground);
        assert_eq!(daisy.location.y, -60.0);
    }

    #[test]
    fn tp_command_validates() {
        let mut state = state();
        assert!(state.cmd_tp(&["Daisy"]).starts_with("Usage"));
        assert_eq!(
            state.cmd_tp(&["Daisy", "world", "a", "1", "2"]),
            "Coordinates must be numbers"
        );
        assert_eq!(
            state.cmd_tp(&["Daisy", "mars", "0", "1", "2"]),
            "Unknown world: mars"
        );
        assert_eq!(
            state.cmd_tp(&["Bob", "world", "0", "1", "2"]),
            "Unknown entity: Bob"
        );
        assert!(state
            .cmd_tp(&["Alice", "world", "0", "-200", "0"])
            .starts_with("Teleported Alice"));
    }

    #[test]
    fn status_lists_entities() {
        let status = state().status();
        assert!(status.starts_with("tick 0 | worlds: world, world_the_end | 2 entities"));
        assert!(status.contains("#1 Alice (player) in world_the_end"));
        assert!(status.contains("Spectator"));
    }

    #[test]
    fn formatting_codes_are_stripped() {
        assert_eq!(strip_formatting("\u{00A7}3Hello \u{00A7}lthere"), "Hello there");
    }
}
