use crate::static_assert_size;
use crate::base::{Matrix, Point};
use crate::grid::Grid;

//////////////////////////////////////////////////////////////////////////////

// TileState

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TileState {
    #[default]
    Unknown,
    NotVisible,
    Visible,
}
static_assert_size!(TileState, 1);

//////////////////////////////////////////////////////////////////////////////

// VisionUnit

// Cached visibility for one registered unit. The cache covers a square local
// area around the tile the unit stood on when it was last swept; while the
// unit stays on that tile, the cache (and its counter contribution) is reused.
pub struct VisionUnit {
    sight_radius: f64,
    grid_radius: f64,
    states: Matrix<TileState>,

    // Valid only while has_cached_data is set:
    anchor: Point,
    origin: Point,
    has_cached_data: bool,
}

impl VisionUnit {
    pub fn new(sight_radius: f64, tile_size: f64) -> Self {
        let resolution = Self::local_area_resolution(sight_radius, tile_size);
        let size = Point(resolution, resolution);
        Self {
            sight_radius,
            grid_radius: sight_radius / tile_size,
            states: Matrix::new(size, TileState::NotVisible),
            anchor: Point::default(),
            origin: Point::default(),
            has_cached_data: false,
        }
    }

    // Side of the square local cache: the sight circle plus at most one tile
    // of slack on each side, wherever the unit stands inside its tile.
    pub fn local_area_resolution(sight_radius: f64, tile_size: f64) -> i32 {
        (2. * sight_radius / tile_size).ceil() as i32 + 1
    }

    pub fn sight_radius(&self) -> f64 { self.sight_radius }

    pub fn grid_radius(&self) -> f64 { self.grid_radius }

    pub fn resolution(&self) -> i32 { self.states.size.0 }

    pub fn cache_len(&self) -> usize { self.states.len() }

    pub fn has_cached_data(&self) -> bool { self.has_cached_data }

    pub fn origin_tile(&self) -> Option<Point> {
        if self.has_cached_data { Some(self.origin) } else { None }
    }

    pub fn anchor(&self) -> Option<Point> {
        if self.has_cached_data { Some(self.anchor) } else { None }
    }

    // Local cache access

    pub fn state(&self, local: Point) -> TileState { self.states[local] }

    pub(crate) fn state_mut(&mut self, local: Point) -> &mut TileState {
        &mut self.states[local]
    }

    pub fn contains(&self, local: Point) -> bool { self.states.contains(local) }

    pub fn local_to_global(&self, local: Point) -> Point { self.anchor + local }

    pub fn global_to_local(&self, global: Point) -> Point { global - self.anchor }

    // The cache's state for a global tile, or Unknown if it is not cached.
    pub fn state_at(&self, global: Point) -> TileState {
        if !self.has_cached_data { return TileState::Unknown; }
        let local = self.global_to_local(global);
        if !self.contains(local) { return TileState::Unknown; }
        self.state(local)
    }

    // Global tiles this unit currently contributes to the grid's counters.
    pub fn visible_tiles(&self) -> impl Iterator<Item = Point> + '_ {
        let cached = self.has_cached_data;
        self.states.points().filter(move |&x| cached && self.state(x) == TileState::Visible)
            .map(move |x| self.local_to_global(x))
    }

    // Whether the sweep around `origin` considers the global tile at all.
    pub(crate) fn admits(&self, grid: &Grid, origin: Point, global: Point) -> bool {
        if !grid.is_valid(global) { return false; }
        let distance = (global - origin).len_l2_squared() as f64;
        distance <= self.grid_radius * self.grid_radius
    }

    // Sweep bookkeeping

    pub(crate) fn begin(&mut self, anchor: Point) {
        debug_assert!(!self.has_cached_data);
        self.anchor = anchor;
    }

    pub(crate) fn clear(&mut self) {
        debug_assert!(!self.has_cached_data);
        self.states.fill(TileState::Unknown);
    }

    pub(crate) fn commit(&mut self, origin: Point) {
        self.origin = origin;
        self.has_cached_data = true;
    }

    /// Withdraws this unit's contribution from the grid's counters and marks
    /// the cache stale. A no-op if there is no cached data.
    pub fn reset(&mut self, grid: &mut Grid) {
        if !self.has_cached_data { return; }

        for local in self.states.points() {
            if self.state(local) != TileState::Visible { continue; }
            let global = self.local_to_global(local);
            debug_assert!(self.admits(grid, self.origin, global));
            grid.remove_viewer(global);
        }
        self.has_cached_data = false;
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Vec2;
    use crate::config::{FogConfig, GridBounds};

    fn grid() -> Grid {
        let bounds = GridBounds::new(Vec2::new(0., 0.), Vec2::new(1000., 1000.));
        Grid::new(&FogConfig::with_bounds(bounds), |_| 0.).unwrap()
    }

    #[test]
    fn test_local_area_resolution() {
        assert_eq!(VisionUnit::local_area_resolution(250., 100.), 6);
        assert_eq!(VisionUnit::local_area_resolution(1000., 100.), 21);
        assert_eq!(VisionUnit::local_area_resolution(120., 100.), 4);
        assert_eq!(VisionUnit::local_area_resolution(0., 100.), 1);

        let unit = VisionUnit::new(250., 100.);
        assert_eq!(unit.resolution(), 6);
        assert_eq!(unit.cache_len(), 36);
        assert_eq!(unit.grid_radius(), 2.5);
        assert!(!unit.has_cached_data());
        assert_eq!(unit.origin_tile(), None);
    }

    #[test]
    fn test_reset_withdraws_counters() {
        let mut grid = grid();
        let mut unit = VisionUnit::new(150., 100.);
        unit.clear();
        unit.begin(Point(3, 3));
        for local in [Point(0, 1), Point(1, 1), Point(2, 1)] {
            *unit.state_mut(local) = TileState::Visible;
            grid.add_viewer(unit.local_to_global(local));
        }
        *unit.state_mut(Point(1, 0)) = TileState::NotVisible;
        grid.add_viewer(Point(4, 4));
        unit.commit(Point(4, 4));

        assert_eq!(unit.visible_tiles().count(), 3);
        assert_eq!(unit.state_at(Point(5, 4)), TileState::Visible);
        assert_eq!(unit.state_at(Point(4, 3)), TileState::NotVisible);
        assert_eq!(unit.state_at(Point(9, 9)), TileState::Unknown);

        unit.reset(&mut grid);
        assert!(!unit.has_cached_data());
        assert_eq!(grid.tile_at(Point(3, 4)).visibility_counter, 0);
        assert_eq!(grid.tile_at(Point(4, 4)).visibility_counter, 1);
        assert_eq!(grid.tile_at(Point(5, 4)).visibility_counter, 0);
        assert_eq!(unit.visible_tiles().count(), 0);

        // Resetting again is a no-op.
        unit.reset(&mut grid);
        assert_eq!(grid.tile_at(Point(4, 4)).visibility_counter, 1);
    }
}
