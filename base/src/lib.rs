pub mod base;
pub mod config;
pub mod fog;
pub mod grid;
pub mod raycast;
pub mod registry;
pub mod sweep;
pub mod vision;
pub mod watcher;

pub use crate::base::{Point, Vec2, Vec3};
pub use crate::config::{ConfigError, FogConfig, GridBounds};
pub use crate::fog::{FogOfWar, FogStats, UnitId};
pub use crate::registry::ServiceRegistry;
pub use crate::watcher::VisibilityWatcher;
