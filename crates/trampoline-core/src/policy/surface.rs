//! Put entities that fall out of a world back on its surface.

use std::collections::BTreeMap;

use tracing::{debug, info};
use trampoline_api::{BlockPos, GameMode, Location, Material, PluginEntity, ServerApi};

use super::{Outcome, RelocationContext};
use crate::config::SurfaceSection;
use crate::destination::DestinationWorld;
use crate::error::RelocationError;
use crate::util;

/// Formatting prefix for the explanatory messages (dark aqua).
const MESSAGE_COLOR: &str = "\u{00A7}3";

/// Upward nudge given on arrival.
const BOUNCE_VELOCITY: (f32, f32, f32) = (0.0, 0.1, 0.0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRelocation {
    /// Scan for another column if the starting one is void or lava.
    safe_scan_enabled: bool,
    /// Distance in blocks between scanned columns. Always `>= 1`.
    safe_scan_step: i32,
    /// Number of extra columns to try. Always `>= 0`.
    safe_scan_tries: i32,
}

impl Default for SurfaceRelocation {
    fn default() -> Self {
        Self::new(false, 1, 0)
    }
}

impl SurfaceRelocation {
    pub fn new(safe_scan_enabled: bool, safe_scan_step: i32, safe_scan_tries: i32) -> Self {
        Self {
            safe_scan_enabled,
            safe_scan_step: safe_scan_step.max(1),
            safe_scan_tries: safe_scan_tries.max(0),
        }
    }

    pub(super) fn load(section: Option<&SurfaceSection>) -> Self {
        match section.and_then(|s| s.safe_scan.as_ref()) {
            Some(scan) => Self::new(scan.enabled, scan.step, scan.tries),
            None => Self::default(),
        }
    }

    pub(super) fn handle(
        &self,
        ctx: &mut RelocationContext<'_>,
        entity: &PluginEntity,
    ) -> Result<Outcome, RelocationError> {
        let from = &entity.location;
        if from.y > ctx.config.thresholds.teleport_y as f32 {
            return Ok(Outcome::Untouched);
        }
        let info = ctx
            .api
            .world_info(&from.world)
            .ok_or_else(|| RelocationError::MissingSourceWorld {
                world: from.world.clone(),
            })?;

        let mut safe = self.find_safe_location(&*ctx.api, &ctx.config.destinations, from);

        // Don't leave anyone at the bottom of a lake either.
        while safe.block_y() < info.max_y
            && ctx.api.block_at(&safe.world, safe.block_pos()).is_liquid()
        {
            safe.y += 1.0;
        }
        let destination = util::centred_xz(&safe);

        ctx.api.set_velocity(entity.runtime_id, BOUNCE_VELOCITY);
        ctx.api.set_fall_distance(entity.runtime_id, 0.0);
        ctx.api.teleport_entity(entity.runtime_id, &destination);
        info!(
            "{} teleported from {} to {}.",
            entity.name,
            util::format_location(from),
            util::format_location(&destination)
        );

        if entity.is_player() {
            for line in [
                "Well, that was awkward!",
                "You shouldn't be able to fall out of this world.",
                "Let us put you here instead!",
            ] {
                ctx.api
                    .send_message(&entity.name, &format!("{MESSAGE_COLOR}{line}"));
            }

            if entity.gamemode == GameMode::Spectator {
                ctx.api.send_message(
                    &entity.name,
                    &format!(
                        "{MESSAGE_COLOR}Looks like spectator mode might be the issue. Let's fix that too."
                    ),
                );
                ctx.api.set_gamemode(entity.runtime_id, GameMode::Survival);
                info!(
                    "{} had their game mode reset from spectator to survival.",
                    entity.name
                );
            }
        }

        Ok(Outcome::Relocated(destination))
    }

    /// Find somewhere safe to stand, starting from `from` and stepping toward
    /// the world origin along the axis `from` is furthest out on.
    ///
    /// A column qualifies when it has a solid block whose upper neighbour is
    /// neither void nor lava. Checks at most `safe_scan_tries + 1` columns,
    /// then falls back to [`Self::fail_safe_location`].
    pub fn find_safe_location(
        &self,
        api: &dyn ServerApi,
        destinations: &BTreeMap<String, DestinationWorld>,
        from: &Location,
    ) -> Location {
        let world = from.world.as_str();
        let mut x = from.block_x();
        let mut z = from.block_z();
        let mut retries = if self.safe_scan_enabled {
            self.safe_scan_tries
        } else {
            0
        };
        let (dx, dz) = if x.abs() > z.abs() {
            (-self.safe_scan_step * util::sign(x), 0)
        } else {
            (0, -self.safe_scan_step * util::sign(z))
        };

        loop {
            if let Some(ground) = util::highest_unpassable_block(api, world, x, z) {
                let feet = ground.above();
                let material = api.block_at(world, feet);
                if material != Material::VoidAir && material != Material::Lava {
                    return Location::of_block(world, feet);
                }
            }

            // Stepping past the edge of the coordinate range ends the search.
            let next = if retries > 0 {
                x.checked_add(dx).zip(z.checked_add(dz))
            } else {
                None
            };
            match next {
                Some((next_x, next_z)) => {
                    x = next_x;
                    z = next_z;
                    retries -= 1;
                }
                None => {
                    debug!(
                        "No safe column found near {}; using fail-safe location.",
                        util::format_block_location(from)
                    );
                    return Self::fail_safe_location(api, destinations, world);
                }
            }
        }
    }

    /// The destination profile's fail-safe point for `world`, moved clear of
    /// solid blocks; without a profile, the top of the highest block at (0, 0).
    pub fn fail_safe_location(
        api: &dyn ServerApi,
        destinations: &BTreeMap<String, DestinationWorld>,
        world: &str,
    ) -> Location {
        if let Some(destination) = destinations.get(world) {
            return util::passable_spawn_location(api, destination.fail_safe_location());
        }
        match api.highest_block_y(world, 0, 0) {
            Some(y) => util::atop(world, BlockPos::new(0, y, 0)),
            None => {
                let min_y = api.world_info(world).map_or(0, |info| info.min_y);
                Location::of_block(world, BlockPos::new(0, min_y, 0))
            }
        }
    }

    pub(super) fn describe(&self) -> String {
        if self.safe_scan_enabled {
            format!(
                "send to surface, safe scan every {} blocks up to {} times",
                self.safe_scan_step, self.safe_scan_tries
            )
        } else {
            "send to surface".to_string()
        }
    }
}
