//! The periodic scan over players and fallen mobs.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, error};
use trampoline_api::ServerApi;

use crate::config::{ActiveConfig, ConfigHandle};
use crate::policy::{Outcome, RelocationContext};

/// Task id the scan is scheduled under.
pub const SCAN_TASK_ID: u32 = 1;

/// Counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub players_checked: usize,
    pub relocated: usize,
    pub affected: usize,
    pub mobs_relocated: usize,
    pub failures: usize,
}

/// Run one cycle against `config`.
///
/// Every online player in a world with an enabled policy is handled, then
/// each enabled sky policy sweeps its source world for fallen mobs. A failure
/// is logged and counted; it never stops the rest of the cycle.
pub fn run_scan(
    config: &ActiveConfig,
    api: &mut dyn ServerApi,
    rng: &mut dyn RngCore,
) -> ScanReport {
    let mut report = ScanReport::default();
    let players = api.online_players();
    let mut ctx = RelocationContext { api, config, rng };

    for player in &players {
        let Some(policy) = config.enabled_policy(&player.location.world) else {
            continue;
        };
        report.players_checked += 1;
        match policy.handle(&mut ctx, player) {
            Ok(Outcome::Untouched) => {}
            Ok(Outcome::Affected) => report.affected += 1,
            Ok(Outcome::Relocated(_)) => report.relocated += 1,
            Err(e) => {
                error!("Could not relocate {}: {e}", player.name);
                report.failures += 1;
            }
        }
    }

    for (world, policy) in &config.policies {
        if !policy.is_enabled() {
            continue;
        }
        let Some(sky) = policy.as_sky() else {
            continue;
        };
        match sky.sweep_entities(&mut ctx) {
            Ok(moved) => report.mobs_relocated += moved,
            Err(e) => {
                error!("Entity sweep of {world} failed: {e}");
                report.failures += 1;
            }
        }
    }

    report
}

/// Owns the RNG and the config handle for the recurring scan.
pub struct ScanTask {
    handle: ConfigHandle,
    rng: StdRng,
}

impl ScanTask {
    pub fn new(handle: ConfigHandle) -> Self {
        Self::with_rng(handle, StdRng::from_entropy())
    }

    pub fn with_rng(handle: ConfigHandle, rng: StdRng) -> Self {
        Self { handle, rng }
    }

    pub fn handle(&self) -> &ConfigHandle {
        &self.handle
    }

    /// Run one cycle on a single snapshot. A reload published while the
    /// cycle runs takes effect on the next one.
    pub fn run(&mut self, api: &mut dyn ServerApi) -> ScanReport {
        let config: Arc<ActiveConfig> = self.handle.snapshot();
        let report = run_scan(&config, api, &mut self.rng);
        if report != ScanReport::default() {
            debug!("Scan at tick {}: {report:?}", api.current_tick());
        }
        report
    }

    /// Queue the next cycle after the current `check-ticks`.
    pub fn schedule(&self, api: &mut dyn ServerApi, plugin_name: &str) {
        let delay = self.handle.snapshot().thresholds.check_ticks;
        api.schedule_delayed(plugin_name, delay, SCAN_TASK_ID);
    }
}
