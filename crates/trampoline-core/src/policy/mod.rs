//! Per-world relocation policies.
//!
//! Each source world maps to one [`RelocationPolicy`]. The policy kind is a
//! closed set, so dispatch is a `match` over [`PolicyKind`] rather than a
//! trait object.

mod sky;
mod surface;

pub use sky::{SkyRelocation, DESTINATION_TRIES};
pub use surface::SurfaceRelocation;

use rand::RngCore;
use trampoline_api::{Location, PluginEntity, ServerApi};

use crate::config::{ActiveConfig, ExitSection};
use crate::error::{ConfigError, RelocationError};

/// Everything a policy needs while handling one entity.
pub struct RelocationContext<'a> {
    pub api: &'a mut dyn ServerApi,
    pub config: &'a ActiveConfig,
    pub rng: &'a mut dyn RngCore,
}

/// What handling an entity did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Above every threshold.
    Untouched,
    /// Status effects applied, no teleport.
    Affected,
    /// Teleported to the given location.
    Relocated(Location),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyKind {
    Sky(SkyRelocation),
    Surface(SurfaceRelocation),
}

/// What happens to entities that fall out of one source world.
#[derive(Debug, Clone, PartialEq)]
pub struct RelocationPolicy {
    enabled: bool,
    kind: PolicyKind,
}

impl RelocationPolicy {
    pub fn new(enabled: bool, kind: PolicyKind) -> Self {
        Self { enabled, kind }
    }

    /// Validate an `exit` section for `world`.
    ///
    /// `Err` means the policy is rejected outright. Bad entries inside an
    /// otherwise valid policy (an unknown mob name, a malformed effect) are
    /// skipped and pushed to `issues`.
    pub fn load(
        world: &str,
        section: &ExitSection,
        issues: &mut Vec<ConfigError>,
    ) -> Result<Self, ConfigError> {
        let kind = match section.send_to.trim() {
            "sky" => PolicyKind::Sky(SkyRelocation::load(
                world,
                section.sky.as_ref(),
                issues,
            )?),
            "surface" => PolicyKind::Surface(SurfaceRelocation::load(section.surface.as_ref())),
            other => {
                return Err(ConfigError::UnknownPolicyKind {
                    world: world.to_string(),
                    kind: other.to_string(),
                })
            }
        };
        Ok(Self::new(section.enabled, kind))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self) -> &PolicyKind {
        &self.kind
    }

    pub fn as_sky(&self) -> Option<&SkyRelocation> {
        match &self.kind {
            PolicyKind::Sky(sky) => Some(sky),
            PolicyKind::Surface(_) => None,
        }
    }

    /// Handle one player at its current position.
    pub fn handle(
        &self,
        ctx: &mut RelocationContext<'_>,
        entity: &PluginEntity,
    ) -> Result<Outcome, RelocationError> {
        match &self.kind {
            PolicyKind::Sky(sky) => sky.handle(ctx, entity),
            PolicyKind::Surface(surface) => surface.handle(ctx, entity),
        }
    }

    pub fn describe(&self) -> String {
        let body = match &self.kind {
            PolicyKind::Sky(sky) => sky.describe(),
            PolicyKind::Surface(surface) => surface.describe(),
        };
        if self.enabled {
            body
        } else {
            format!("(disabled) {body}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SkySection, SurfaceSection};

    fn section(send_to: &str) -> ExitSection {
        ExitSection {
            enabled: true,
            send_to: send_to.into(),
            sky: Some(SkySection {
                world: Some("world".into()),
                y: 250,
                ..SkySection::default()
            }),
            surface: Some(SurfaceSection::default()),
        }
    }

    #[test]
    fn load_dispatches_on_kind() {
        let mut issues = Vec::new();
        let sky = RelocationPolicy::load("end", &section("sky"), &mut issues).unwrap();
        assert!(sky.as_sky().is_some());
        let surface = RelocationPolicy::load("world", &section("surface"), &mut issues).unwrap();
        assert!(matches!(surface.kind(), PolicyKind::Surface(_)));
        assert!(issues.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut issues = Vec::new();
        let err = RelocationPolicy::load("world", &section("ocean"), &mut issues).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported send-to action \"ocean\" for world \"world\""
        );
    }

    #[test]
    fn disabled_policy_still_loads() {
        let mut s = section("surface");
        s.enabled = false;
        let policy = RelocationPolicy::load("world", &s, &mut Vec::new()).unwrap();
        assert!(!policy.is_enabled());
        assert!(policy.describe().starts_with("(disabled) send to surface"));
    }
}
