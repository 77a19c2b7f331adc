use crate::base::Point;
use crate::grid::Grid;
use crate::vision::{TileState, VisionUnit};

//////////////////////////////////////////////////////////////////////////////

// Public API

pub struct RayArgs {
    // Local cache coordinates of the unit's own tile.
    pub origin: Point,
    // World-space height of the unit's eyes, fixed for a whole sweep.
    pub eye_height: f32,
    pub threshold: f32,
}

#[inline(always)]
pub fn is_blocking(eye_height: f32, height: f32, threshold: f32) -> bool {
    height - eye_height > threshold
}

/// Resolves the visibility of `target` (a local cache cell) by marching a
/// grid-aligned ray from it back to the origin cell.
///
/// Every cell the ray passes through is resolved along with the target: if
/// nothing on the way blocks, all of them are Visible; otherwise all of them
/// that are not already Visible become NotVisible. Targets that are already
/// resolved are left alone.
///
/// `stack` is scratch space for the visited cells; it is empty on return.
pub fn march(grid: &Grid, unit: &mut VisionUnit, stack: &mut Vec<Point>,
             target: Point, args: &RayArgs) {
    debug_assert!(stack.is_empty());
    if unit.state(target) != TileState::Unknown { return; }

    let RayArgs { origin, eye_height, threshold } = *args;
    let dir = origin - target;
    debug_assert!(dir != Point::default());
    let sign = Point(if dir.0 >= 0 { 1 } else { -1 }, if dir.1 >= 0 { 1 } else { -1 });

    // Ray length covered by one step along each axis. An axis the ray never
    // crosses gets an infinite step and is never advanced.
    let (dx, dy) = (dir.0 as f32, dir.1 as f32);
    let step_x = (1. + (dy / dx) * (dy / dx)).sqrt();
    let step_y = (1. + (dx / dy) * (dx / dy)).sqrt();

    // Total ray length at the next crossing on each axis. We start from the
    // middle of the target cell, so the first crossing is half a step away.
    let mut next_x = 0.5 * step_x;
    let mut next_y = 0.5 * step_y;

    // A ray visits exactly one cell per axis crossing, plus the target.
    let limit = dir.len_taxicab() + 1;
    let mut current = target;
    let mut blocked = false;
    let mut finished = false;

    for _ in 0..limit {
        stack.push(current);
        if current == origin { finished = true; break; }

        let height = grid.tile_at(unit.local_to_global(current)).height;
        if is_blocking(eye_height, height, threshold) {
            blocked = true;
            finished = true;
            break;
        }

        if next_x < next_y {
            next_x += step_x;
            current.0 += sign.0;
        } else {
            next_y += step_y;
            current.1 += sign.1;
        }
        debug_assert!(unit.contains(current));
    }
    assert!(finished, "Ray from {:?} to {:?} exceeded {} steps", target, origin, limit);

    while let Some(local) = stack.pop() {
        let state = unit.state_mut(local);
        if !blocked {
            *state = TileState::Visible;
        } else if *state != TileState::Visible {
            *state = TileState::NotVisible;
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
