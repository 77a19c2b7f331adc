use crate::base::{HashMap, Point, Vec2, Vec3};
use crate::config::{ConfigError, FogConfig};
use crate::grid::Grid;
use crate::sweep::Sweeper;
use crate::vision::VisionUnit;

//////////////////////////////////////////////////////////////////////////////

// Public API

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UnitId(pub u64);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FogStats {
    pub registered_units: usize,
    // Local cache cells allocated across all registered units.
    pub cached_tiles: usize,
    // Sweeps run since construction. Units that stay on their tile don't count.
    pub sweeps: u64,
}

/// Tracks which tiles of a height-mapped grid are seen by any registered
/// vision unit, recomputing a unit's contribution only when it changes tiles.
pub struct FogOfWar {
    config: FogConfig,
    grid: Grid,
    units: HashMap<UnitId, VisionUnit>,
    sweeper: Sweeper,
    snapshot: Vec<u8>,
    sweeps: u64,
}

impl FogOfWar {
    pub fn new<F: Fn(Vec2) -> f32>(config: FogConfig, height_at: F) -> Result<Self, ConfigError> {
        let grid = Grid::new(&config, height_at)?;
        let mut snapshot = vec![];
        grid.write_snapshot(&mut snapshot);
        Ok(Self {
            config,
            grid,
            units: HashMap::default(),
            sweeper: Sweeper::default(),
            snapshot,
            sweeps: 0,
        })
    }

    pub fn config(&self) -> &FogConfig { &self.config }

    pub fn grid(&self) -> &Grid { &self.grid }

    pub fn unit(&self, id: UnitId) -> Option<&VisionUnit> { self.units.get(&id) }

    pub fn is_registered(&self, id: UnitId) -> bool { self.units.contains_key(&id) }

    pub fn is_location_visible(&self, location: Vec2) -> bool {
        self.grid.is_visible(location)
    }

    // One byte per tile in tile index order, as of the last update.
    pub fn visibility_snapshot(&self) -> &[u8] { &self.snapshot }

    pub fn stats(&self) -> FogStats {
        FogStats {
            registered_units: self.units.len(),
            cached_tiles: self.units.values().map(|x| x.cache_len()).sum(),
            sweeps: self.sweeps,
        }
    }

    // Registration

    pub fn register(&mut self, id: UnitId, sight_radius: f64) {
        if self.units.contains_key(&id) {
            log::info!("Vision unit {:?} is already registered", id);
            return;
        }
        let radius = if sight_radius.is_finite() && sight_radius >= 0. {
            sight_radius
        } else {
            log::warn!("Vision unit {:?} has invalid sight radius {}; using 0", id, sight_radius);
            0.
        };
        let radius = if radius > self.max_sight_radius() {
            log::debug!("Vision unit {:?} sees the whole grid; clamping radius {}", id, radius);
            self.max_sight_radius()
        } else {
            radius
        };
        let unit = VisionUnit::new(radius, self.grid.tile_size());
        log::info!("Registered vision unit {:?}: radius {}, {} cached tiles",
                   id, radius, unit.cache_len());
        self.units.insert(id, unit);
    }

    pub fn unregister(&mut self, id: UnitId) -> bool {
        let Some(mut unit) = self.units.remove(&id) else {
            log::warn!("Tried to unregister unknown vision unit {:?}", id);
            return false;
        };
        unit.reset(&mut self.grid);
        log::info!("Unregistered vision unit {:?}", id);
        true
    }

    pub fn set_sight_radius(&mut self, id: UnitId, sight_radius: f64) -> bool {
        if !self.unregister(id) { return false; }
        self.register(id, sight_radius);
        true
    }

    // Per-step driver

    /// Brings every unit's contribution up to date. `locate` returns the
    /// world-space eye position of a unit's owner.
    ///
    /// A unit that is still on the tile of its last sweep is skipped, even if
    /// its eye height changed.
    pub fn update<F: FnMut(UnitId) -> Vec3>(&mut self, mut locate: F) {
        let threshold = self.config.vision_blocking_delta_height_threshold;
        for (&id, unit) in self.units.iter_mut() {
            let eye = locate(id);
            let cached = unit.origin_tile();
            if cached.is_some() && cached == self.grid.world_to_tile(eye.xy()) { continue; }

            self.sweeper.sweep(&mut self.grid, unit, eye, threshold);
            self.sweeps += 1;
        }
        self.grid.write_snapshot(&mut self.snapshot);
    }

    // Reconfiguration

    /// Applies a new config. If the grid's bounds or tile size changed, the
    /// grid is rebuilt with freshly sampled heights and every unit's cache is
    /// reallocated for the new tile size. Otherwise, all caches are dropped
    /// so that the next update recomputes them.
    ///
    /// On error, nothing changes.
    pub fn on_config_changed<F: Fn(Vec2) -> f32>(
            &mut self, config: FogConfig, height_at: F) -> Result<(), ConfigError> {
        config.resolution()?;

        if self.config.changes_grid(&config) {
            self.grid = Grid::new(&config, height_at)?;
            let (tile_size, limit) = (self.grid.tile_size(), self.max_sight_radius());
            for unit in self.units.values_mut() {
                *unit = VisionUnit::new(unit.sight_radius().min(limit), tile_size);
            }
        } else {
            self.reset_all();
        }

        self.config = config;
        self.grid.write_snapshot(&mut self.snapshot);
        Ok(())
    }

    pub fn set_vision_blocking_threshold(&mut self, threshold: f32) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.vision_blocking_delta_height_threshold = threshold;
        config.resolution()?;

        log::info!("Vision blocking threshold: {} -> {}",
                   self.config.vision_blocking_delta_height_threshold, threshold);
        self.config = config;
        self.reset_all();
        self.grid.write_snapshot(&mut self.snapshot);
        Ok(())
    }

    // Every tile is within this distance of any point on the grid.
    fn max_sight_radius(&self) -> f64 {
        let Point(w, h) = self.grid.resolution();
        self.grid.tile_size() * (w + h) as f64
    }

    fn reset_all(&mut self) {
        for unit in self.units.values_mut() { unit.reset(&mut self.grid); }
    }
}

//////////////////////////////////////////////////////////////////////////////
