use crate::base::{Point, Vec3};
use crate::grid::Grid;
use crate::raycast::{march, RayArgs};
use crate::vision::{TileState, VisionUnit};

//////////////////////////////////////////////////////////////////////////////

// Spiral traversal

const DIRECTIONS: [Point; 4] = [Point(0, 1), Point(1, 0), Point(0, -1), Point(-1, 0)];

// Visits every cell of a square of the given side exactly once, walking
// clockwise from the corner at (0, 0) along the outer ring and then inward.
// Legs shrink by one after every second turn: n, n - 1, n - 1, n - 2, ...
//
// Outer cells come first, so the long rays from the edge of the sight area
// resolve most of the interior before we reach it.
pub struct Spiral {
    current: Point,
    dir: usize,
    step: i32,
    left: i32,
    clock: bool,
    done: bool,
}

impl Spiral {
    pub fn new(side: i32) -> Self {
        Self {
            current: Point::default() - DIRECTIONS[0],
            dir: 0,
            step: side,
            left: side,
            clock: true,
            done: side <= 0,
        }
    }
}

impl Iterator for Spiral {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done { return None; }

        debug_assert!(self.left > 0);
        self.current += DIRECTIONS[self.dir];
        self.left -= 1;
        let result = self.current;

        if self.left == 0 {
            if self.clock {
                if self.step == 1 {
                    self.done = true;
                    return Some(result);
                }
                self.step -= 1;
            }
            self.clock = !self.clock;
            self.dir = (self.dir + 1) % DIRECTIONS.len();
            self.left = self.step;
        }
        Some(result)
    }
}

//////////////////////////////////////////////////////////////////////////////

// Sweeper

#[derive(Default)]
pub struct Sweeper {
    // Scratch space for the ray march, empty between calls.
    stack: Vec<Point>,
}

impl Sweeper {
    /// Rebuilds `unit`'s cache for an observer at `eye` and applies the
    /// result to the grid's counters, replacing its previous contribution.
    ///
    /// If `eye` is outside the grid, the unit is left with no cached data and
    /// contributes nothing.
    pub fn sweep(&mut self, grid: &mut Grid, unit: &mut VisionUnit, eye: Vec3, threshold: f32) {
        let origin_grid = grid.world_to_grid(eye.xy());

        unit.reset(grid);
        unit.clear();

        let Some(origin) = grid.world_to_tile(eye.xy()) else {
            log::debug!("Vision unit at {:?} is outside the grid", eye);
            return;
        };

        let anchor = Grid::grid_to_tile(origin_grid - unit.grid_radius());
        unit.begin(anchor);
        let local_origin = unit.global_to_local(origin);
        *unit.state_mut(local_origin) = TileState::Visible;

        let args = RayArgs { origin: local_origin, eye_height: eye.z as f32, threshold };
        for local in Spiral::new(unit.resolution()) {
            let global = unit.local_to_global(local);
            if !unit.admits(grid, origin, global) { continue; }
            march(grid, unit, &mut self.stack, local, &args);
            debug_assert!(unit.state(local) != TileState::Unknown);
        }

        unit.commit(origin);
        let mut visible = 0;
        for global in unit.visible_tiles() {
            debug_assert!(unit.admits(grid, origin, global));
            grid.add_viewer(global);
            visible += 1;
        }
        log::trace!("Swept {:?} at {:?}: {} visible tiles", origin, anchor, visible);
    }
}

//////////////////////////////////////////////////////////////////////////////
