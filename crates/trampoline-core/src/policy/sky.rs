//! Send entities that fall out of one world into the sky of another.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};
use trampoline_api::{EffectKind, EntityKind, Location, PluginEntity, StatusEffect, WorldBorder};

use super::{Outcome, RelocationContext};
use crate::config::SkySection;
use crate::destination::DestinationWorld;
use crate::error::{ConfigError, RelocationError};
use crate::util;

/// Attempts at finding a destination outside every exclusion zone before
/// settling for the last candidate.
pub const DESTINATION_TRIES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SkyRelocation {
    source_world: String,
    destination_world: String,
    destination_y: i32,
    messages: Vec<String>,
    effects: Vec<StatusEffect>,
    teleported_kinds: BTreeSet<EntityKind>,
}

impl SkyRelocation {
    pub fn new(source_world: &str, destination_world: &str, destination_y: i32) -> Self {
        Self {
            source_world: source_world.to_string(),
            destination_world: destination_world.to_string(),
            destination_y,
            messages: Vec::new(),
            effects: Vec::new(),
            teleported_kinds: BTreeSet::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_effects(mut self, effects: Vec<StatusEffect>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_teleported_kinds(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        self.teleported_kinds = kinds.into_iter().collect();
        self
    }

    pub(super) fn load(
        world: &str,
        section: Option<&SkySection>,
        issues: &mut Vec<ConfigError>,
    ) -> Result<Self, ConfigError> {
        let missing = || ConfigError::MissingDestinationWorld {
            world: world.to_string(),
        };
        let section = section.ok_or_else(missing)?;
        let destination = section
            .world
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(missing)?;
        if section.y <= 0 {
            return Err(ConfigError::InvalidDestinationY {
                world: world.to_string(),
                y: section.y,
            });
        }

        let mut effects = Vec::with_capacity(section.effects.len());
        for entry in &section.effects {
            let invalid = |reason: String| ConfigError::InvalidEffect {
                world: world.to_string(),
                reason,
            };
            let kind = match entry.kind.parse::<EffectKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    issues.push(invalid(format!("{e}")));
                    continue;
                }
            };
            if entry.duration <= 0 || entry.amplifier < 0 {
                issues.push(invalid(format!(
                    "{} needs a positive duration and non-negative amplifier",
                    entry.kind
                )));
                continue;
            }
            effects.push(StatusEffect {
                kind,
                duration_ticks: entry.duration,
                amplifier: entry.amplifier,
                show_particles: entry.particles,
            });
        }

        let mut kinds = BTreeSet::new();
        for name in &section.teleport_mobs {
            match name.parse::<EntityKind>() {
                // players are handled by the scan itself, never swept
                Ok(kind) if kind != EntityKind::Player => {
                    kinds.insert(kind);
                }
                _ => issues.push(ConfigError::InvalidEntityKind {
                    world: world.to_string(),
                    name: name.clone(),
                }),
            }
        }

        Ok(Self::new(world, destination, section.y)
            .with_messages(section.messages.clone())
            .with_effects(effects)
            .with_teleported_kinds(kinds))
    }

    pub(super) fn handle(
        &self,
        ctx: &mut RelocationContext<'_>,
        entity: &PluginEntity,
    ) -> Result<Outcome, RelocationError> {
        let thresholds = ctx.config.thresholds;
        let y = entity.location.y;
        let mut outcome = Outcome::Untouched;

        if y <= thresholds.effect_y as f32 && !self.effects.is_empty() {
            // Each application replaces the active effect of the same kind.
            for effect in &self.effects {
                ctx.api.add_effect(entity.runtime_id, effect);
            }
            outcome = Outcome::Affected;
        }

        if y <= thresholds.teleport_y as f32 {
            let destination = self.teleport_entity(ctx, entity)?;
            if entity.is_player() {
                if let Some(template) = self.messages.choose(&mut *ctx.rng) {
                    let message = template.replace("&p", &entity.name);
                    ctx.api
                        .send_message(&entity.name, &util::translate_color_codes('&', &message));
                }
            }
            outcome = Outcome::Relocated(destination);
        }

        Ok(outcome)
    }

    /// Teleport every eligible non-player entity that has fallen out of the
    /// source world. Returns how many were moved.
    pub fn sweep_entities(&self, ctx: &mut RelocationContext<'_>) -> Result<usize, RelocationError> {
        if self.teleported_kinds.is_empty() {
            return Ok(0);
        }
        let entities = ctx.api.world_entities(&self.source_world).ok_or_else(|| {
            RelocationError::MissingSourceWorld {
                world: self.source_world.clone(),
            }
        })?;

        let limit = ctx.config.thresholds.entity_teleport_y as f32;
        let mut moved = 0;
        for entity in entities.iter().filter(|e| {
            !e.is_player() && self.teleported_kinds.contains(&e.kind) && e.location.y <= limit
        }) {
            self.teleport_entity(ctx, entity)?;
            moved += 1;
        }
        Ok(moved)
    }

    fn teleport_entity(
        &self,
        ctx: &mut RelocationContext<'_>,
        entity: &PluginEntity,
    ) -> Result<Location, RelocationError> {
        let config = ctx.config;
        let profile = config
            .destinations
            .get(&self.destination_world)
            .ok_or_else(|| RelocationError::MissingDestinationProfile {
                entity: format!("{} {}", entity.kind, entity.name),
                world: self.destination_world.clone(),
            })?;
        let info = ctx
            .api
            .world_info(&self.destination_world)
            .ok_or_else(|| RelocationError::MissingWorld {
                entity: format!("{} {}", entity.kind, entity.name),
                world: self.destination_world.clone(),
            })?;

        let destination = self.choose_destination(
            profile,
            &info.border,
            config.thresholds.world_border_buffer,
            &mut *ctx.rng,
        );
        ctx.api.teleport_entity(entity.runtime_id, &destination);
        info!(
            "{} ({}) teleported from {} to {}.",
            entity.name,
            entity.uuid,
            util::format_location(&entity.location),
            util::format_location(&destination)
        );
        Ok(destination)
    }

    /// Pick a point at `destination_y` inside the border (less `buffer`),
    /// avoiding the profile's exclusion zones when possible.
    ///
    /// After [`DESTINATION_TRIES`] rejected candidates the last one is used
    /// anyway; a rescue is never blocked by exclusions.
    pub fn choose_destination<R: Rng + ?Sized>(
        &self,
        profile: &DestinationWorld,
        border: &WorldBorder,
        buffer: i32,
        rng: &mut R,
    ) -> Location {
        let half_width = allowed_half_width(border.size, buffer);
        let center_x = border.center_x.floor() as i32;
        let center_z = border.center_z.floor() as i32;

        let mut candidate = self.candidate(rng, center_x, center_z, half_width);
        let mut tries = 1;
        while !profile.allows_entry(&candidate) {
            if tries == DESTINATION_TRIES {
                warn!(
                    "No destination in {} outside exclusion zones after {tries} tries; using {}.",
                    self.destination_world,
                    util::format_block_location(&candidate)
                );
                break;
            }
            candidate = self.candidate(rng, center_x, center_z, half_width);
            tries += 1;
        }
        candidate
    }

    fn candidate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        center_x: i32,
        center_z: i32,
        half_width: i32,
    ) -> Location {
        let x = util::random_int(rng, center_x - half_width, center_x + half_width);
        let z = util::random_int(rng, center_z - half_width, center_z + half_width);
        util::centred_xz(&Location::new(
            self.destination_world.clone(),
            x as f32,
            self.destination_y as f32,
            z as f32,
        ))
    }

    pub(super) fn describe(&self) -> String {
        let effects = if self.effects.is_empty() {
            "no effects".to_string()
        } else {
            let list: Vec<String> = self
                .effects
                .iter()
                .map(|e| format!("{} ticks {} x {}", e.duration_ticks, e.kind, e.amplifier + 1))
                .collect();
            format!("{} effects: {}", self.effects.len(), list.join(", "))
        };
        let messages = if self.messages.is_empty() {
            "no messages".to_string()
        } else {
            let list: Vec<String> = self.messages.iter().map(|m| format!("    {m}")).collect();
            format!("{}, messages:\n{}", self.messages.len(), list.join("\n"))
        };
        let kinds: Vec<&str> = self.teleported_kinds.iter().map(|k| k.name()).collect();
        format!(
            "send to sky of {}, Y{}, along with [{}], {effects}, {messages}",
            self.destination_world,
            self.destination_y,
            kinds.join(",")
        )
    }
}

/// Half the side of the square that sky destinations are drawn from:
/// `floor(size / 2) - buffer`, never negative.
pub fn allowed_half_width(border_size: f64, buffer: i32) -> i32 {
    ((border_size as i32) / 2 - buffer).max(0)
}
