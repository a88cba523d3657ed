//! Void-fall rescue: detect entities that have fallen below a world and put
//! them somewhere survivable, either in the sky of another world or back on
//! the surface of the same one.

pub mod config;
pub mod destination;
pub mod error;
pub mod exclusion;
pub mod plugin;
pub mod policy;
pub mod scan;
pub mod util;

#[cfg(test)]
mod testing;

pub use config::{ActiveConfig, ConfigHandle, Thresholds, TrampolineConfig};
pub use destination::DestinationWorld;
pub use error::{ConfigError, RelocationError};
pub use exclusion::ExclusionZone;
pub use plugin::{TrampolinePlugin, COMMAND, PLUGIN_NAME};
pub use policy::{Outcome, PolicyKind, RelocationPolicy, SkyRelocation, SurfaceRelocation};
pub use scan::{run_scan, ScanReport, ScanTask, SCAN_TASK_ID};
