//! In-memory `ServerApi` used by unit tests across the crate.

use std::collections::HashMap;

use trampoline_api::{
    BlockPos, EntityKind, GameMode, Location, Material, PluginEntity, ServerApi, StatusEffect,
    WorldBorder, WorldInfo,
};

pub fn entity(runtime_id: u64, name: &str, kind: EntityKind, location: Location) -> PluginEntity {
    PluginEntity {
        runtime_id,
        uuid: format!("00000000-0000-0000-0000-{runtime_id:012}"),
        name: name.into(),
        kind,
        location,
        gamemode: GameMode::Survival,
    }
}

pub fn player(runtime_id: u64, name: &str, location: Location) -> PluginEntity {
    entity(runtime_id, name, EntityKind::Player, location)
}

pub struct MockApi {
    pub worlds: HashMap<String, WorldInfo>,
    pub blocks: HashMap<(String, BlockPos), Material>,
    pub entities: Vec<PluginEntity>,
    pub tick: u64,

    pub teleports: Vec<(u64, Location)>,
    pub velocities: Vec<(u64, (f32, f32, f32))>,
    pub fall_distances: Vec<(u64, f32)>,
    pub effects: Vec<(u64, StatusEffect)>,
    pub gamemodes: Vec<(u64, GameMode)>,
    pub messages: Vec<(String, String)>,
    pub scheduled: Vec<(String, u64, u32)>,
    pub cancelled: Vec<(String, u32)>,
    pub commands: Vec<(String, String)>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            worlds: HashMap::new(),
            blocks: HashMap::new(),
            entities: Vec::new(),
            tick: 0,
            teleports: Vec::new(),
            velocities: Vec::new(),
            fall_distances: Vec::new(),
            effects: Vec::new(),
            gamemodes: Vec::new(),
            messages: Vec::new(),
            scheduled: Vec::new(),
            cancelled: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Add a world spanning Y -64..=319 with a square border.
    pub fn with_world(mut self, name: &str, border_size: f64) -> Self {
        self.worlds.insert(
            name.into(),
            WorldInfo {
                name: name.into(),
                min_y: -64,
                max_y: 319,
                border: WorldBorder {
                    center_x: 0.0,
                    center_z: 0.0,
                    size: border_size,
                },
            },
        );
        self
    }

    pub fn set_block(&mut self, world: &str, pos: BlockPos, material: Material) {
        self.blocks.insert((world.into(), pos), material);
    }

    /// Fill `from_y..=to_y` of one column with `material`.
    pub fn fill_column(
        &mut self,
        world: &str,
        x: i32,
        z: i32,
        from_y: i32,
        to_y: i32,
        material: Material,
    ) {
        for y in from_y..=to_y {
            self.set_block(world, BlockPos::new(x, y, z), material);
        }
    }

    pub fn add_entity(&mut self, entity: PluginEntity) {
        self.entities.push(entity);
    }
}

impl ServerApi for MockApi {
    fn online_players(&self) -> Vec<PluginEntity> {
        self.entities
            .iter()
            .filter(|e| e.is_player())
            .cloned()
            .collect()
    }

    fn world_entities(&self, world: &str) -> Option<Vec<PluginEntity>> {
        self.worlds.get(world)?;
        Some(
            self.entities
                .iter()
                .filter(|e| e.location.world == world)
                .cloned()
                .collect(),
        )
    }

    fn world_info(&self, world: &str) -> Option<WorldInfo> {
        self.worlds.get(world).cloned()
    }

    fn highest_block_y(&self, world: &str, x: i32, z: i32) -> Option<i32> {
        self.blocks
            .iter()
            .filter(|((w, pos), material)| {
                w == world && pos.x == x && pos.z == z && **material != Material::Air
            })
            .map(|((_, pos), _)| pos.y)
            .max()
    }

    fn block_at(&self, world: &str, pos: BlockPos) -> Material {
        let Some(info) = self.worlds.get(world) else {
            return Material::VoidAir;
        };
        if pos.y < info.min_y || pos.y > info.max_y {
            return Material::VoidAir;
        }
        self.blocks
            .get(&(world.to_string(), pos))
            .copied()
            .unwrap_or(Material::Air)
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn teleport_entity(&mut self, runtime_id: u64, destination: &Location) {
        self.teleports.push((runtime_id, destination.clone()));
    }

    fn set_velocity(&mut self, runtime_id: u64, velocity: (f32, f32, f32)) {
        self.velocities.push((runtime_id, velocity));
    }

    fn set_fall_distance(&mut self, runtime_id: u64, distance: f32) {
        self.fall_distances.push((runtime_id, distance));
    }

    fn add_effect(&mut self, runtime_id: u64, effect: &StatusEffect) {
        self.effects.push((runtime_id, *effect));
    }

    fn set_gamemode(&mut self, runtime_id: u64, gamemode: GameMode) {
        self.gamemodes.push((runtime_id, gamemode));
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.messages
            .push((player_name.to_string(), message.to_string()));
    }

    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.scheduled
            .push((plugin_name.to_string(), delay_ticks, task_id));
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.cancelled.push((plugin_name.to_string(), task_id));
    }

    fn register_command(&mut self, name: &str, description: &str, _plugin_name: &str) {
        self.commands
            .push((name.to_string(), description.to_string()));
    }
}
