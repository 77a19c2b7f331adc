use crate::base::{Matrix, Point, Vec2};
use crate::config::{ConfigError, FogConfig};

//////////////////////////////////////////////////////////////////////////////

// Tile

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    // Ground elevation, or -inf where there is no ground at all.
    pub height: f32,
    // Number of registered vision units that currently see this tile.
    pub visibility_counter: i32,
}

impl Default for Tile {
    fn default() -> Self { Self { height: f32::NEG_INFINITY, visibility_counter: 0 } }
}

impl Tile {
    pub fn is_visible(&self) -> bool { self.visibility_counter > 0 }
}

//////////////////////////////////////////////////////////////////////////////

// Grid

// The static tile grid. Geometry and heights are fixed at construction; only
// the visibility counters change afterwards.
pub struct Grid {
    tiles: Matrix<Tile>,
    bottom_left: Vec2,
    tile_size: f64,
}

impl Grid {
    /// Builds the grid described by `config`, sampling `height_at` once at
    /// the world-space center of every tile.
    pub fn new<F: Fn(Vec2) -> f32>(config: &FogConfig, height_at: F) -> Result<Self, ConfigError> {
        let resolution = config.resolution()?;
        let Some(bounds) = config.bounds else { return Err(ConfigError::MissingBounds); };

        let mut grid = Self {
            tiles: Matrix::new(resolution, Tile::default()),
            bottom_left: bounds.min,
            tile_size: config.tile_size,
        };
        for point in grid.tiles.points() {
            let height = height_at(grid.tile_center_world(point));
            grid.tiles[point].height = height;
        }

        log::info!("Built {}x{} fog of war grid with tile size {}",
                   resolution.0, resolution.1, grid.tile_size);
        Ok(grid)
    }

    pub fn resolution(&self) -> Point { self.tiles.size }

    pub fn tile_size(&self) -> f64 { self.tile_size }

    pub fn bottom_left(&self) -> Vec2 { self.bottom_left }

    pub fn tiles(&self) -> &[Tile] { &self.tiles.data }

    // Coordinate conversions

    pub fn world_to_grid(&self, world: Vec2) -> Vec2 {
        let Vec2 { x, y } = world - self.bottom_left;
        Vec2::new(x / self.tile_size, y / self.tile_size)
    }

    // Floors a grid-space location to a tile. The result may be invalid.
    pub fn grid_to_tile(grid: Vec2) -> Point {
        Point(grid.x.floor() as i32, grid.y.floor() as i32)
    }

    pub fn world_to_tile(&self, world: Vec2) -> Option<Point> {
        if !world.is_finite() { return None; }
        let tile = Self::grid_to_tile(self.world_to_grid(world));
        if self.is_valid(tile) { Some(tile) } else { None }
    }

    pub fn tile_center_world(&self, tile: Point) -> Vec2 {
        let half = self.tile_size / 2.;
        Vec2::new(self.bottom_left.x + self.tile_size * tile.0 as f64 + half,
                  self.bottom_left.y + self.tile_size * tile.1 as f64 + half)
    }

    #[inline(always)]
    pub fn is_valid(&self, tile: Point) -> bool { self.tiles.contains(tile) }

    pub fn tile_index(&self, tile: Point) -> Option<usize> { self.tiles.index(tile) }

    pub fn tile_at(&self, tile: Point) -> &Tile { &self.tiles[tile] }

    // Visibility queries

    pub fn is_visible(&self, world: Vec2) -> bool {
        let Some(tile) = self.world_to_tile(world) else { return false; };
        self.tile_at(tile).is_visible()
    }

    pub fn visible_tiles(&self) -> usize {
        self.tiles.data.iter().filter(|x| x.is_visible()).count()
    }

    // Writes one byte per tile, in tile index order: 0xff if visible, else 0.
    pub fn write_snapshot(&self, buffer: &mut Vec<u8>) {
        buffer.clear();
        buffer.extend(self.tiles.data.iter().map(|x| if x.is_visible() { 0xff } else { 0 }));
    }

    // Counter updates. Callers must only pass valid tiles.

    pub(crate) fn add_viewer(&mut self, tile: Point) {
        self.tiles[tile].visibility_counter += 1;
    }

    pub(crate) fn remove_viewer(&mut self, tile: Point) {
        let entry = &mut self.tiles[tile].visibility_counter;
        assert!(*entry > 0, "Visibility counter underflow at {:?}", tile);
        *entry -= 1;
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridBounds;

    fn config(x: f64, y: f64) -> FogConfig {
        let bounds = GridBounds::new(Vec2::new(-200., 100.), Vec2::new(-200. + x, 100. + y));
        FogConfig::with_bounds(bounds)
    }

    #[test]
    fn test_conversions() {
        let grid = Grid::new(&config(1000., 500.), |_| 0.).unwrap();
        assert_eq!(grid.resolution(), Point(10, 5));
        assert_eq!(grid.world_to_grid(Vec2::new(-150., 350.)), Vec2::new(0.5, 2.5));
        assert_eq!(grid.world_to_tile(Vec2::new(-150., 350.)), Some(Point(0, 2)));
        assert_eq!(grid.tile_center_world(Point(3, 1)), Vec2::new(150., 250.));
        assert_eq!(grid.world_to_tile(grid.tile_center_world(Point(9, 4))), Some(Point(9, 4)));
        assert_eq!(grid.tile_index(Point(3, 1)), Some(16));
    }

    #[test]
    fn test_out_of_grid() {
        let grid = Grid::new(&config(1000., 500.), |_| 0.).unwrap();
        assert_eq!(Grid::grid_to_tile(Vec2::new(-0.5, 1.)), Point(-1, 1));
        assert!(grid.world_to_tile(Vec2::new(-201., 150.)).is_none());
        assert!(grid.world_to_tile(Vec2::new(800., 150.)).is_none());
        assert!(grid.world_to_tile(Vec2::new(0., 600.)).is_none());
        assert!(!grid.is_valid(Point(10, 0)));
        assert!(!grid.is_visible(Vec2::new(-1000., -1000.)));
        assert!(grid.tile_index(Point(0, 5)).is_none());
        assert!(grid.world_to_tile(Vec2::new(f64::NAN, 150.)).is_none());
    }

    #[test]
    fn test_heights_sampled_at_tile_centers() {
        let grid = Grid::new(&config(300., 200.), |p| (p.x + 10. * p.y) as f32).unwrap();
        for i in 0..3 {
            for j in 0..2 {
                let center = grid.tile_center_world(Point(i, j));
                let expected = (center.x + 10. * center.y) as f32;
                assert_eq!(grid.tile_at(Point(i, j)).height, expected);
            }
        }
    }

    #[test]
    fn test_counters_and_snapshot() {
        let mut grid = Grid::new(&config(300., 200.), |_| 0.).unwrap();
        grid.add_viewer(Point(1, 1));
        grid.add_viewer(Point(1, 1));
        grid.add_viewer(Point(2, 0));
        grid.remove_viewer(Point(1, 1));
        assert!(grid.is_visible(grid.tile_center_world(Point(1, 1))));
        assert_eq!(grid.visible_tiles(), 2);

        let mut buffer = vec![1, 2, 3];
        grid.write_snapshot(&mut buffer);
        assert_eq!(buffer, vec![0, 0, 0, 0xff, 0xff, 0]);
    }

    #[test]
    #[should_panic]
    fn test_counter_underflow_panics() {
        let mut grid = Grid::new(&config(300., 200.), |_| 0.).unwrap();
        grid.remove_viewer(Point(0, 0));
    }

    #[test]
    fn test_invalid_config() {
        let mut bad = config(300., 200.);
        bad.tile_size = -5.;
        assert!(Grid::new(&bad, |_| 0.).is_err());
    }
}
