//! Ties the simulation state to the plugin manager.

use tracing::info;

use crate::plugin_manager::PluginManager;
use crate::state::ServerState;

pub struct Server {
    pub state: ServerState,
    pub plugins: PluginManager,
}

impl Server {
    pub fn new(state: ServerState, plugins: PluginManager) -> Self {
        Self { state, plugins }
    }

    /// Enable every registered plugin.
    pub fn start(&mut self) {
        let actions = self.plugins.enable_all(&self.state);
        self.state.apply_plugin_actions(actions);
    }

    /// Physics first, then scheduled plugin tasks see the moved entities.
    pub fn game_tick(&mut self) {
        self.state.game_tick();
        let actions = self.plugins.tick_scheduler(&self.state);
        self.state.apply_plugin_actions(actions);
    }

    pub fn handle_console_command(&mut self, line: &str) -> String {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd_name, args)) = parts.split_first() else {
            return String::new();
        };
        match cmd_name {
            "help" => {
                let mut commands: Vec<&str> =
                    self.plugins.plugin_commands.keys().map(String::as_str).collect();
                commands.sort_unstable();
                format!(
                    "Commands: help, status, stop, tp <entity> <world> <x> <y> <z>{}{}",
                    if commands.is_empty() { "" } else { ", " },
                    commands.join(", ")
                )
            }
            "status" => self.state.status(),
            "tp" => self.state.cmd_tp(args),
            _ if self.plugins.plugin_commands.contains_key(cmd_name) => {
                let raw_args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
                let (response, actions) =
                    self.plugins
                        .handle_command(cmd_name, &raw_args, "console", &self.state);
                self.state.apply_plugin_actions(actions);
                response.unwrap_or_default()
            }
            _ => format!("Unknown command: {cmd_name}. Try help."),
        }
    }

    /// Disable plugins, cancelling their scheduled tasks.
    pub fn shutdown(&mut self) {
        let actions = self.plugins.disable_all(&self.state);
        self.state.apply_plugin_actions(actions);
        info!("Plugins disabled at tick {}", self.state.current_tick());
    }
}
