//! Host binding: lifecycle, the recurring scan task and the admin command.

use std::path::PathBuf;

use tracing::{error, info, warn};
use trampoline_api::{Plugin, PluginInfo, ServerApi};

use crate::config::{ConfigHandle, TrampolineConfig};
use crate::error::ConfigError;
use crate::scan::{ScanTask, SCAN_TASK_ID};
use crate::util::COLOR_CHAR;

pub const PLUGIN_NAME: &str = "Trampoline";
pub const COMMAND: &str = "trampoline";

pub struct TrampolinePlugin {
    /// Re-read on every reload when set; otherwise the last loaded value is used.
    config_path: Option<PathBuf>,
    config: TrampolineConfig,
    scan: ScanTask,
}

impl Default for TrampolinePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl TrampolinePlugin {
    pub fn new() -> Self {
        Self::with_scan(ScanTask::new(ConfigHandle::default()))
    }

    /// Use a specific scan task, e.g. one with a seeded RNG.
    pub fn with_scan(scan: ScanTask) -> Self {
        Self {
            config_path: None,
            config: TrampolineConfig::default(),
            scan,
        }
    }

    /// Read the configuration from `path` on enable and on every reload.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config_handle(&self) -> &ConfigHandle {
        self.scan.handle()
    }

    /// Load (or re-load) the configuration and publish it.
    ///
    /// An unreadable or malformed file leaves the published configuration
    /// untouched. Returns the number of entries excluded as invalid.
    pub fn reload(&mut self) -> Result<usize, ConfigError> {
        if let Some(path) = &self.config_path {
            self.config = TrampolineConfig::load(path)?;
        }
        Ok(self.config_handle().apply(&self.config, true))
    }
}

impl Plugin for TrampolinePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Rescue players and mobs that fall into the void.".into(),
            author: "trampoline contributors".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        if let Err(e) = self.reload() {
            error!("Could not load configuration, using defaults: {e}");
            self.config_handle().apply(&self.config, true);
        }
        api.register_command(COMMAND, "Reload the Trampoline configuration.", PLUGIN_NAME);
        self.scan.schedule(api, PLUGIN_NAME);
        info!("{PLUGIN_NAME} enabled.");
    }

    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        api.cancel_task(PLUGIN_NAME, SCAN_TASK_ID);
        info!("{PLUGIN_NAME} disabled.");
    }

    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        if task_id != SCAN_TASK_ID {
            warn!("Unknown task id {task_id}");
            return;
        }
        self.scan.run(api);
        self.scan.schedule(api, PLUGIN_NAME);
    }

    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        _sender: &str,
        _api: &mut dyn ServerApi,
    ) -> Option<String> {
        if !command.eq_ignore_ascii_case(COMMAND) {
            return None;
        }
        let reply = match args {
            [] => usage(),
            [arg] if arg.eq_ignore_ascii_case("help") => usage(),
            [arg] if arg.eq_ignore_ascii_case("reload") => match self.reload() {
                Ok(_) => format!("{COLOR_CHAR}3{PLUGIN_NAME} configuration reloaded."),
                Err(e) => {
                    error!("Reload failed: {e}");
                    format!("{COLOR_CHAR}c{PLUGIN_NAME} configuration could not be reloaded: {e}")
                }
            },
            _ => format!("{COLOR_CHAR}cInvalid arguments. Try /{COMMAND} help."),
        };
        Some(reply)
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        serde_json::to_value(TrampolineConfig::default()).ok()
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match TrampolineConfig::from_json(config) {
            Ok(config) => self.config = config,
            Err(e) => error!("Ignoring invalid configuration: {e}"),
        }
    }
}

fn usage() -> String {
    format!("{COLOR_CHAR}e/{COMMAND} reload {COLOR_CHAR}7- Reload the configuration.")
}
