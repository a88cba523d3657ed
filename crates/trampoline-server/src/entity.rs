//! Simulated entities and their per-tick movement.

use trampoline_api::{
    BlockPos, EffectKind, EntityKind, GameMode, Location, PluginEntity, StatusEffect,
};

use crate::world::SimWorld;

/// Downward acceleration per tick (blocks/tick²).
pub const GRAVITY: f32 = 0.08;

/// Velocity multiplier applied every tick.
pub const DRAG: f32 = 0.98;

/// Maximum vertical distance per tick (terminal velocity + margin).
pub const MAX_FALL_PER_TICK: f32 = 4.0;

/// Fall speed cap while slow falling.
pub const SLOW_FALL_PER_TICK: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveEffect {
    pub effect: StatusEffect,
    pub remaining_ticks: i32,
}

#[derive(Debug, Clone)]
pub struct SimEntity {
    pub runtime_id: u64,
    pub uuid: String,
    pub name: String,
    pub kind: EntityKind,
    pub location: Location,
    pub gamemode: GameMode,
    pub velocity: (f32, f32, f32),
    pub fall_distance: f32,
    pub on_ground: bool,
    pub effects: Vec<ActiveEffect>,
}

impl SimEntity {
    pub fn new(
        runtime_id: u64,
        name: impl Into<String>,
        kind: EntityKind,
        location: Location,
    ) -> Self {
        Self {
            runtime_id,
            uuid: format!("00000000-0000-4000-8000-{runtime_id:012x}"),
            name: name.into(),
            kind,
            location,
            gamemode: GameMode::Survival,
            velocity: (0.0, 0.0, 0.0),
            fall_distance: 0.0,
            on_ground: false,
            effects: Vec::new(),
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn to_plugin(&self) -> PluginEntity {
        PluginEntity {
            runtime_id: self.runtime_id,
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            kind: self.kind,
            location: self.location.clone(),
            gamemode: self.gamemode,
        }
    }

    /// Replace any active effect of the same kind.
    pub fn add_effect(&mut self, effect: StatusEffect) {
        self.effects.retain(|e| e.effect.kind != effect.kind);
        self.effects.push(ActiveEffect {
            effect,
            remaining_ticks: effect.duration_ticks,
        });
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.effect.kind == kind)
    }

    pub fn teleport(&mut self, destination: Location) {
        self.location = destination;
        self.on_ground = false;
    }

    /// Advance one tick in `world`. Returns the fall distance if the entity
    /// landed this tick.
    pub fn tick(&mut self, world: &SimWorld) -> Option<f32> {
        for e in &mut self.effects {
            e.remaining_ticks -= 1;
        }
        self.effects.retain(|e| e.remaining_ticks > 0);

        if self.gamemode == GameMode::Spectator || self.on_ground {
            return None;
        }

        let (vx, vy, vz) = self.velocity;
        let mut vy = ((vy - GRAVITY) * DRAG).max(-MAX_FALL_PER_TICK);
        if self.has_effect(EffectKind::SlowFalling) {
            vy = vy.max(-SLOW_FALL_PER_TICK);
        }
        self.location.x += vx;
        self.location.z += vz;
        self.velocity = (vx * DRAG, vy, vz * DRAG);

        let from = self.location.y;
        let to = from + vy;
        if vy >= 0.0 {
            self.location.y = to;
            return None;
        }

        // The first solid block whose top lies in [to, from] stops the fall.
        let x = self.location.block_x();
        let z = self.location.block_z();
        let mut b = (from.ceil() as i32) - 1;
        let lowest = (to.ceil() as i32) - 1;
        while b >= lowest {
            if !world.block_at(BlockPos::new(x, b, z)).is_passable() && (b + 1) as f32 <= from {
                let fallen = self.fall_distance + (from - (b + 1) as f32);
                self.location.y = (b + 1) as f32;
                self.velocity = (0.0, 0.0, 0.0);
                self.fall_distance = 0.0;
                self.on_ground = true;
                return Some(fallen);
            }
            b -= 1;
        }

        self.location.y = to;
        self.fall_distance += from - to;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Generator;
    use trampoline_api::{WorldBorder, WorldInfo};

    fn flat() -> SimWorld {
        SimWorld::new(
            WorldInfo {
                name: "world".into(),
                min_y: -64,
                max_y: 319,
                border: WorldBorder {
                    center_x: 0.0,
                    center_z: 0.0,
                    size: 1000.0,
                },
            },
            Generator::Flat,
        )
    }

    fn cow_at(y: f32) -> SimEntity {
        SimEntity::new(7, "Daisy", EntityKind::Cow, Location::new("world", 0.5, y, 0.5))
    }

    #[test]
    fn falls_and_lands_on_surface() {
        let world = flat();
        let mut cow = cow_at(-50.0);
        let mut landed = None;
        for _ in 0..100 {
            if let Some(d) = cow.tick(&world) {
                landed = Some(d);
                break;
            }
        }
        assert!(cow.on_ground);
        assert_eq!(cow.location.y, -60.0);
        let fallen = landed.unwrap();
        assert!((fallen - 10.0).abs() < 1e-3, "fell {fallen}");
        assert_eq!(cow.fall_distance, 0.0);
    }

    #[test]
    fn fall_speed_is_capped() {
        let world = flat();
        let mut cow = cow_at(10_000.0);
        for _ in 0..500 {
            let before = cow.location.y;
            cow.tick(&world);
            assert!(before - cow.location.y <= MAX_FALL_PER_TICK + 1e-3);
        }
    }

    #[test]
    fn void_world_falls_forever() {
        let world = SimWorld::new(flat().info().clone(), Generator::Void);
        let mut cow = cow_at(0.0);
        for _ in 0..200 {
            assert_eq!(cow.tick(&world), None);
        }
        assert!(cow.location.y < -200.0);
        assert!(cow.fall_distance > 200.0);
    }

    #[test]
    fn upward_velocity_then_fall() {
        let world = flat();
        let mut cow = cow_at(-60.0);
        cow.velocity = (0.0, 0.1, 0.0);
        cow.tick(&world);
        assert!(cow.location.y > -60.0);
        for _ in 0..20 {
            cow.tick(&world);
        }
        assert!(cow.on_ground);
        assert_eq!(cow.location.y, -60.0);
    }

    #[test]
    fn effects_replace_and_expire() {
        let mut cow = cow_at(-60.0);
        cow.on_ground = true;
        let effect = StatusEffect {
            kind: EffectKind::Blindness,
            duration_ticks: 3,
            amplifier: 0,
            show_particles: true,
        };
        cow.add_effect(effect);
        cow.add_effect(effect);
        assert_eq!(cow.effects.len(), 1);
        let world = flat();
        cow.tick(&world);
        cow.tick(&world);
        assert!(cow.has_effect(EffectKind::Blindness));
        cow.tick(&world);
        assert!(!cow.has_effect(EffectKind::Blindness));
    }

    #[test]
    fn slow_falling_limits_speed() {
        let world = SimWorld::new(flat().info().clone(), Generator::Void);
        let mut cow = cow_at(100.0);
        cow.add_effect(StatusEffect {
            kind: EffectKind::SlowFalling,
            duration_ticks: 100,
            amplifier: 0,
            show_particles: false,
        });
        for _ in 0..50 {
            cow.tick(&world);
        }
        assert!(cow.location.y > 100.0 - 50.0 * SLOW_FALL_PER_TICK - 1e-3);
    }

    #[test]
    fn spectators_do_not_move() {
        let world = flat();
        let mut ghost = cow_at(50.0);
        ghost.gamemode = GameMode::Spectator;
        ghost.tick(&world);
        assert_eq!(ghost.location.y, 50.0);
    }
}
