//! Plugin manager: loads, enables, schedules and routes commands to plugins.

use std::collections::HashMap;
use std::path::Path;

use trampoline_api::{
    BlockPos, GameMode, Location, Material, Plugin, PluginEntity, ServerApi, StatusEffect,
    WorldInfo,
};
use tracing::{info, warn};

use crate::state::ServerState;

// ─── Types ───────────────────────────────────────────────────────────────────

/// A scheduled task owned by a plugin.
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
}

/// Deferred side-effect requested by a plugin during a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    SendMessage {
        player_name: String,
        message: String,
    },
    TeleportEntity {
        runtime_id: u64,
        destination: Location,
    },
    SetVelocity {
        runtime_id: u64,
        velocity: (f32, f32, f32),
    },
    SetFallDistance {
        runtime_id: u64,
        distance: f32,
    },
    AddEffect {
        runtime_id: u64,
        effect: StatusEffect,
    },
    SetGamemode {
        runtime_id: u64,
        gamemode: GameMode,
    },
    RegisterCommand {
        name: String,
        description: String,
        plugin_name: String,
    },
    ScheduleTask {
        plugin_name: String,
        task_id: u32,
        delay_ticks: u64,
    },
    CancelTask {
        plugin_name: String,
        task_id: u32,
    },
}

impl PendingAction {
    /// Actions the plugin manager handles itself rather than the world.
    fn is_internal(&self) -> bool {
        matches!(
            self,
            PendingAction::RegisterCommand { .. }
                | PendingAction::ScheduleTask { .. }
                | PendingAction::CancelTask { .. }
        )
    }
}

// ─── ServerApiImpl ───────────────────────────────────────────────────────────

/// Implements `ServerApi` reading the live server state and accumulating
/// PendingActions for writes.
struct ServerApiImpl<'a> {
    state: &'a ServerState,
    actions: Vec<PendingAction>,
}

impl<'a> ServerApiImpl<'a> {
    fn new(state: &'a ServerState) -> Self {
        Self {
            state,
            actions: Vec::new(),
        }
    }

    fn take_actions(self) -> Vec<PendingAction> {
        self.actions
    }
}

impl ServerApi for ServerApiImpl<'_> {
    fn online_players(&self) -> Vec<PluginEntity> {
        self.state
            .entities()
            .iter()
            .filter(|e| e.is_player())
            .map(|e| e.to_plugin())
            .collect()
    }

    fn world_entities(&self, world: &str) -> Option<Vec<PluginEntity>> {
        self.state.world(world)?;
        Some(
            self.state
                .entities()
                .iter()
                .filter(|e| e.location.world == world)
                .map(|e| e.to_plugin())
                .collect(),
        )
    }

    fn world_info(&self, world: &str) -> Option<WorldInfo> {
        self.state.world(world).map(|w| w.info().clone())
    }

    fn highest_block_y(&self, world: &str, x: i32, z: i32) -> Option<i32> {
        self.state.world(world)?.highest_block_y(x, z)
    }

    fn block_at(&self, world: &str, pos: BlockPos) -> Material {
        match self.state.world(world) {
            Some(w) => w.block_at(pos),
            None => Material::VoidAir,
        }
    }

    fn current_tick(&self) -> u64 {
        self.state.current_tick()
    }

    fn teleport_entity(&mut self, runtime_id: u64, destination: &Location) {
        self.actions.push(PendingAction::TeleportEntity {
            runtime_id,
            destination: destination.clone(),
        });
    }

    fn set_velocity(&mut self, runtime_id: u64, velocity: (f32, f32, f32)) {
        self.actions
            .push(PendingAction::SetVelocity { runtime_id, velocity });
    }

    fn set_fall_distance(&mut self, runtime_id: u64, distance: f32) {
        self.actions
            .push(PendingAction::SetFallDistance { runtime_id, distance });
    }

    fn add_effect(&mut self, runtime_id: u64, effect: &StatusEffect) {
        self.actions.push(PendingAction::AddEffect {
            runtime_id,
            effect: *effect,
        });
    }

    fn set_gamemode(&mut self, runtime_id: u64, gamemode: GameMode) {
        self.actions
            .push(PendingAction::SetGamemode { runtime_id, gamemode });
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.actions.push(PendingAction::SendMessage {
            player_name: player_name.to_string(),
            message: message.to_string(),
        });
    }

    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.actions.push(PendingAction::ScheduleTask {
            plugin_name: plugin_name.to_string(),
            task_id,
            delay_ticks,
        });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.actions.push(PendingAction::CancelTask {
            plugin_name: plugin_name.to_string(),
            task_id,
        });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.actions.push(PendingAction::RegisterCommand {
            name: name.to_string(),
            description: description.to_string(),
            plugin_name: plugin_name.to_string(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Manages all loaded plugins, their scheduled tasks, and command registrations.
///
/// Every entry point applies scheduler and command actions itself and
/// returns the remaining world actions for the caller to apply.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    /// Commands registered by plugins: command_name → plugin_name.
    pub plugin_commands: HashMap<String, String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            tasks: Vec::new(),
            plugin_commands: HashMap::new(),
        }
    }

    /// Register a plugin (call before enable_all).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        info!("Registered plugin: {}", plugin.info().name);
        self.plugins.push(plugin);
    }

    #[cfg(test)]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Enable all registered plugins.
    pub fn enable_all(&mut self, state: &ServerState) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(state);
            plugin.on_enable(&mut api);
            all_actions.extend(api.take_actions());
        }
        self.apply_internal_actions(all_actions)
    }

    /// Disable all registered plugins.
    pub fn disable_all(&mut self, state: &ServerState) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(state);
            plugin.on_disable(&mut api);
            all_actions.extend(api.take_actions());
        }
        self.apply_internal_actions(all_actions)
    }

    /// Tick the scheduler. Returns pending actions from fired tasks.
    pub fn tick_scheduler(&mut self, state: &ServerState) -> Vec<PendingAction> {
        let mut fired: Vec<(String, u32)> = Vec::new();

        // Decrement and collect fired tasks
        for task in &mut self.tasks {
            if task.remaining_ticks > 0 {
                task.remaining_ticks -= 1;
            }
            if task.remaining_ticks == 0 {
                fired.push((task.plugin_name.clone(), task.task_id));
            }
        }
        self.tasks.retain(|t| t.remaining_ticks > 0);

        let mut all_actions = Vec::new();
        for (plugin_name, task_id) in fired {
            if let Some(plugin) = self
                .plugins
                .iter_mut()
                .find(|p| p.info().name == plugin_name)
            {
                let mut api = ServerApiImpl::new(state);
                plugin.on_task(task_id, &mut api);
                all_actions.extend(api.take_actions());
            }
        }

        self.apply_internal_actions(all_actions)
    }

    /// Handle a plugin-registered command. Returns (response_message, pending_actions).
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        state: &ServerState,
    ) -> (Option<String>, Vec<PendingAction>) {
        let plugin_name = match self.plugin_commands.get(command) {
            Some(name) => name.clone(),
            None => return (None, Vec::new()),
        };

        if let Some(plugin) = self
            .plugins
            .iter_mut()
            .find(|p| p.info().name == plugin_name)
        {
            let mut api = ServerApiImpl::new(state);
            let response = plugin.on_command(command, args, sender, &mut api);
            let actions = api.take_actions();
            (response, self.apply_internal_actions(actions))
        } else {
            (None, Vec::new())
        }
    }

    /// Load configs for all plugins from `dir/<plugin>/config.json`, writing
    /// the default config when no file exists yet.
    pub fn load_configs(&mut self, dir: &Path) {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            if let Some(default_config) = plugin.default_config() {
                let plugin_dir = dir.join(&info.name);
                let config_path = plugin_dir.join("config.json");

                let config = if config_path.exists() {
                    match std::fs::read_to_string(&config_path) {
                        Ok(data) => match serde_json::from_str(&data) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!("Failed to parse config for {}: {e}", info.name);
                                default_config.clone()
                            }
                        },
                        Err(e) => {
                            warn!("Failed to read config for {}: {e}", info.name);
                            default_config.clone()
                        }
                    }
                } else {
                    // Write default config
                    std::fs::create_dir_all(&plugin_dir).ok();
                    if let Ok(json) = serde_json::to_string_pretty(&default_config) {
                        std::fs::write(&config_path, json).ok();
                    }
                    default_config
                };

                plugin.load_config(config);
            }
        }
    }

    /// Apply RegisterCommand, ScheduleTask and CancelTask in order; return
    /// everything else.
    fn apply_internal_actions(&mut self, actions: Vec<PendingAction>) -> Vec<PendingAction> {
        let (internal, world): (Vec<_>, Vec<_>) =
            actions.into_iter().partition(PendingAction::is_internal);
        for action in internal {
            match action {
                PendingAction::RegisterCommand {
                    name, plugin_name, ..
                } => {
                    self.plugin_commands.insert(name, plugin_name);
                }
                PendingAction::ScheduleTask {
                    plugin_name,
                    task_id,
                    delay_ticks,
                } => {
                    self.tasks.push(ScheduledTask {
                        plugin_name,
                        task_id,
                        // A zero delay still waits for the next tick.
                        remaining_ticks: delay_ticks.max(1),
                    });
                }
                PendingAction::CancelTask {
                    plugin_name,
                    task_id,
                } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == plugin_name && t.task_id == task_id));
                }
                _ => {}
            }
        }
        world
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
