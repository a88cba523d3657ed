//! Circular no-entry zones for sky relocation.

use trampoline_api::Location;

/// A circle in the XZ plane that sky relocation avoids landing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionZone {
    pub center_x: i32,
    pub center_z: i32,
    /// Always `>= 0`; negative radii are rejected at load time.
    pub radius: i32,
}

impl ExclusionZone {
    pub fn new(center_x: i32, center_z: i32, radius: i32) -> Self {
        Self {
            center_x,
            center_z,
            radius,
        }
    }

    /// True if the planar distance from `(x, z)` to the center is at most `radius`.
    pub fn contains_xz(&self, x: f64, z: f64) -> bool {
        let dx = x - f64::from(self.center_x);
        let dz = z - f64::from(self.center_z);
        let radius = f64::from(self.radius);
        dx * dx + dz * dz <= radius * radius
    }

    /// True if the zone contains the XZ projection of `loc`.
    pub fn contains(&self, loc: &Location) -> bool {
        self.contains_xz(f64::from(loc.x), f64::from(loc.z))
    }

    pub fn describe(&self) -> String {
        format!(
            "within {} blocks of ({},{})",
            self.radius, self.center_x, self.center_z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_center() {
        let zone = ExclusionZone::new(100, -50, 10);
        assert!(zone.contains_xz(100.0, -50.0));
    }

    #[test]
    fn boundary_is_inside() {
        let zone = ExclusionZone::new(0, 0, 5);
        assert!(zone.contains_xz(3.0, 4.0));
        assert!(zone.contains_xz(-5.0, 0.0));
        assert!(!zone.contains_xz(3.0, 4.01));
    }

    #[test]
    fn wide_zone_boundary_is_exact() {
        let zone = ExclusionZone::new(0, 0, 50_000);
        assert!(zone.contains_xz(30_000.0, 40_000.0));
        assert!(!zone.contains_xz(30_000.0, 40_001.0));
    }

    #[test]
    fn zero_radius_contains_only_center() {
        let zone = ExclusionZone::new(7, 7, 0);
        assert!(zone.contains_xz(7.0, 7.0));
        assert!(!zone.contains_xz(7.5, 7.0));
    }

    #[test]
    fn contains_ignores_y() {
        let zone = ExclusionZone::new(0, 0, 100);
        assert!(zone.contains(&Location::new("world", 50.5, 300.0, 50.5)));
        assert!(zone.contains(&Location::new("world", 50.5, -300.0, 50.5)));
        assert!(!zone.contains(&Location::new("world", 80.5, 0.0, 80.5)));
    }

    #[test]
    fn matches_euclidean_distance_over_grid() {
        let zone = ExclusionZone::new(-3, 4, 6);
        for x in -12..=6 {
            for z in -5..=13 {
                let d = (((x + 3) * (x + 3) + (z - 4) * (z - 4)) as f64).sqrt();
                assert_eq!(zone.contains_xz(x as f64, z as f64), d <= 6.0, "({x},{z})");
            }
        }
    }

    #[test]
    fn description() {
        let zone = ExclusionZone::new(10, -20, 300);
        assert_eq!(zone.describe(), "within 300 blocks of (10,-20)");
    }
}
