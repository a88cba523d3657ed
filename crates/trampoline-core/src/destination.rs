//! Per-world details used when a world is a relocation target.

use trampoline_api::{BlockPos, Location};

use crate::error::ConfigError;
use crate::exclusion::ExclusionZone;

/// A world as a teleport destination: its guaranteed-safe fallback point and
/// the zones that sky relocation should avoid.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationWorld {
    world: String,
    fail_safe: BlockPos,
    exclusions: Vec<ExclusionZone>,
}

impl DestinationWorld {
    /// Build a destination profile.
    ///
    /// Zones with a negative radius are dropped and returned as issues; the
    /// profile itself always loads because the fail-safe point is mandatory
    /// in the schema.
    pub fn load(
        world: &str,
        fail_safe: BlockPos,
        zones: impl IntoIterator<Item = ExclusionZone>,
    ) -> (Self, Vec<ConfigError>) {
        let mut issues = Vec::new();
        let exclusions = zones
            .into_iter()
            .filter(|zone| {
                if zone.radius < 0 {
                    issues.push(ConfigError::NegativeRadius {
                        world: world.to_string(),
                        x: zone.center_x,
                        z: zone.center_z,
                        radius: zone.radius,
                    });
                    false
                } else {
                    true
                }
            })
            .collect();
        (
            Self {
                world: world.to_string(),
                fail_safe,
                exclusions,
            },
            issues,
        )
    }

    pub fn exclusions(&self) -> &[ExclusionZone] {
        &self.exclusions
    }

    /// True unless some exclusion zone contains `loc`.
    pub fn allows_entry(&self, loc: &Location) -> bool {
        !self.exclusions.iter().any(|zone| zone.contains(loc))
    }

    /// The configured safe point, in this profile's world.
    pub fn fail_safe_location(&self) -> Location {
        Location::of_block(self.world.clone(), self.fail_safe)
    }

    pub fn describe(&self) -> String {
        let exclusions = if self.exclusions.is_empty() {
            String::new()
        } else {
            let zones: Vec<String> = self.exclusions.iter().map(|z| z.describe()).collect();
            format!(" exclude {}", zones.join(", "))
        };
        format!(
            "{exclusions} failsafe ({},{},{})",
            self.fail_safe.x, self.fail_safe.y, self.fail_safe.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(zones: Vec<ExclusionZone>) -> DestinationWorld {
        let (dest, issues) = DestinationWorld::load("world", BlockPos::new(0, 64, 0), zones);
        assert!(issues.is_empty());
        dest
    }

    #[test]
    fn empty_exclusions_always_allow() {
        let dest = profile(Vec::new());
        for (x, z) in [(0.0, 0.0), (1e5, -1e5), (-3.5, 2.5)] {
            assert!(dest.allows_entry(&Location::new("world", x, 80.0, z)));
        }
    }

    #[test]
    fn any_zone_blocks_entry() {
        let dest = profile(vec![
            ExclusionZone::new(0, 0, 100),
            ExclusionZone::new(1000, 1000, 10),
        ]);
        assert!(!dest.allows_entry(&Location::new("world", 50.5, 80.0, 50.5)));
        assert!(!dest.allows_entry(&Location::new("world", 1005.5, 80.0, 995.5)));
        assert!(dest.allows_entry(&Location::new("world", 500.5, 80.0, 500.5)));
    }

    #[test]
    fn fail_safe_is_tagged_with_world() {
        let (dest, _) = DestinationWorld::load("nether", BlockPos::new(8, 70, -8), Vec::new());
        assert_eq!(dest.fail_safe_location(), Location::new("nether", 8.0, 70.0, -8.0));
    }

    #[test]
    fn negative_radius_zone_is_dropped() {
        let (dest, issues) = DestinationWorld::load(
            "world",
            BlockPos::new(0, 64, 0),
            vec![ExclusionZone::new(0, 0, -1), ExclusionZone::new(5, 5, 3)],
        );
        assert_eq!(dest.exclusions(), &[ExclusionZone::new(5, 5, 3)]);
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            ConfigError::NegativeRadius { radius: -1, .. }
        ));
    }

    #[test]
    fn description_lists_zones() {
        let dest = profile(vec![ExclusionZone::new(0, 0, 50)]);
        assert_eq!(
            dest.describe(),
            " exclude within 50 blocks of (0,0) failsafe (0,64,0)"
        );
        assert_eq!(profile(Vec::new()).describe(), " failsafe (0,64,0)");
    }
}
