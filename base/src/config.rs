use std::fmt::{Display, Formatter};

use crate::base::{Point, Vec2};

//////////////////////////////////////////////////////////////////////////////

// Constants

pub const DEFAULT_SIGHT_RADIUS: f64 = 1000.;
pub const DEFAULT_TILE_SIZE: f64 = 100.;
pub const DEFAULT_VISION_BLOCKING_DELTA_HEIGHT_THRESHOLD: f32 = 200.;

// Squared tile distances are computed in i32-sized coordinates; past this
// resolution the sums risk overflow.
pub const MAX_GRID_RESOLUTION_SUM: i32 = 10_000;

//////////////////////////////////////////////////////////////////////////////

// GridBounds

// The axis-aligned world-space area covered by the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds { pub min: Vec2, pub max: Vec2 }

impl GridBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self { Self { min, max } }

    pub fn from_center(center: Vec2, extent: Vec2) -> Self {
        Self { min: center - extent, max: center + extent }
    }

    pub fn size(&self) -> Vec2 { self.max - self.min }
}

//////////////////////////////////////////////////////////////////////////////

// FogConfig

#[derive(Clone, Debug, PartialEq)]
pub struct FogConfig {
    pub bounds: Option<GridBounds>,
    pub tile_size: f64,
    pub vision_blocking_delta_height_threshold: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            tile_size: DEFAULT_TILE_SIZE,
            vision_blocking_delta_height_threshold: DEFAULT_VISION_BLOCKING_DELTA_HEIGHT_THRESHOLD,
        }
    }
}

impl FogConfig {
    pub fn with_bounds(bounds: GridBounds) -> Self {
        Self { bounds: Some(bounds), ..Default::default() }
    }

    // Validates the config and returns the grid resolution it implies.
    pub fn resolution(&self) -> Result<Point, ConfigError> {
        let tile_size = self.tile_size;
        if !(tile_size.is_finite() && tile_size > 0.) {
            return Err(ConfigError::InvalidTileSize(tile_size));
        }
        let threshold = self.vision_blocking_delta_height_threshold;
        if !(threshold.is_finite() && threshold >= 0.) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        let Some(bounds) = self.bounds else { return Err(ConfigError::MissingBounds); };
        let size = bounds.size();
        let valid = bounds.min.is_finite() && bounds.max.is_finite();
        if !valid || size.x <= 0. || size.y <= 0. {
            return Err(ConfigError::InvalidBounds(bounds));
        }

        let (x, y) = ((size.x / tile_size).ceil(), (size.y / tile_size).ceil());
        let limit = MAX_GRID_RESOLUTION_SUM as f64;
        if x + y > limit {
            return Err(ConfigError::ResolutionTooLarge { width: x, height: y });
        }
        Ok(Point(x as i32, y as i32))
    }

    // True if switching from `self` to `other` requires a new grid.
    pub fn changes_grid(&self, other: &FogConfig) -> bool {
        self.bounds != other.bounds || self.tile_size != other.tile_size
    }
}

//////////////////////////////////////////////////////////////////////////////

// ConfigError

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    MissingBounds,
    InvalidBounds(GridBounds),
    InvalidTileSize(f64),
    InvalidThreshold(f32),
    ResolutionTooLarge { width: f64, height: f64 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBounds => write!(f, "grid bounds were not set"),
            Self::InvalidBounds(x) =>
                write!(f, "grid bounds are empty or non-finite: {:?} .. {:?}", x.min, x.max),
            Self::InvalidTileSize(x) => write!(f, "tile size must be positive: {}", x),
            Self::InvalidThreshold(x) =>
                write!(f, "vision blocking threshold must be non-negative: {}", x),
            Self::ResolutionTooLarge { width, height } =>
                write!(f, "grid resolution {}x{} exceeds {} tiles per side sum",
                       width, height, MAX_GRID_RESOLUTION_SUM),
        }
    }
}

impl std::error::Error for ConfigError {}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(x: f64, y: f64) -> GridBounds {
        GridBounds::new(Vec2::new(0., 0.), Vec2::new(x, y))
    }

    #[test]
    fn test_resolution_rounds_up() {
        let config = FogConfig::with_bounds(bounds(1050., 300.));
        assert_eq!(config.resolution(), Ok(Point(11, 3)));
    }

    #[test]
    fn test_centered_bounds() {
        let bounds = GridBounds::from_center(Vec2::new(100., -50.), Vec2::new(250., 50.));
        assert_eq!(bounds.min, Vec2::new(-150., -100.));
        assert_eq!(bounds.max, Vec2::new(350., 0.));
        let config = FogConfig::with_bounds(bounds);
        assert_eq!(config.resolution(), Ok(Point(5, 1)));
    }

    #[test]
    fn test_config_errors() {
        assert_eq!(FogConfig::default().resolution(), Err(ConfigError::MissingBounds));

        let mut config = FogConfig::with_bounds(bounds(100., 100.));
        config.tile_size = 0.;
        assert_eq!(config.resolution(), Err(ConfigError::InvalidTileSize(0.)));

        let mut config = FogConfig::with_bounds(bounds(100., 100.));
        config.vision_blocking_delta_height_threshold = -1.;
        assert_eq!(config.resolution(), Err(ConfigError::InvalidThreshold(-1.)));

        let config = FogConfig::with_bounds(bounds(0., 100.));
        assert!(matches!(config.resolution(), Err(ConfigError::InvalidBounds(_))));

        let mut config = FogConfig::with_bounds(bounds(6000., 6000.));
        config.tile_size = 1.;
        assert!(matches!(config.resolution(), Err(ConfigError::ResolutionTooLarge { .. })));
    }

    #[test]
    fn test_changes_grid() {
        let config = FogConfig::with_bounds(bounds(100., 100.));
        let mut other = config.clone();
        other.vision_blocking_delta_height_threshold = 50.;
        assert!(!config.changes_grid(&other));
        other.tile_size = 50.;
        assert!(config.changes_grid(&other));
    }
}
