use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};

use fow_base::base::{Matrix, Point, Vec2, RNG};

//////////////////////////////////////////////////////////////////////////////

// Constants

pub const TILE_SIZE: f64 = 100.;

const HILL_HEIGHT: f64 = 250.;
const HILL_HEIGHT_STDDEV: f64 = 150.;
const HILL_RADIUS: f64 = 3.;
const HILL_RADIUS_STDDEV: f64 = 1.5;
const TILES_PER_HILL: i32 = 80;

const RIDGE_HEIGHT: f32 = 600.;
const RIDGE_LENGTH: i32 = 12;
const TILES_PER_RIDGE: i32 = 300;

// Ground below this is flooded: there is no ground at all to block vision.
const WATER_LEVEL: f64 = -120.;

//////////////////////////////////////////////////////////////////////////////

// Generation

// Rolling hills and pits, a few sharp ridges, and water where the pits are
// deepest. Heights are per tile.
pub fn generate(size: Point, rng: &mut RNG) -> Result<Matrix<f32>, NormalError> {
    let height = Normal::new(HILL_HEIGHT, HILL_HEIGHT_STDDEV)?;
    let radius = Normal::new(HILL_RADIUS, HILL_RADIUS_STDDEV)?;

    let area = size.0 * size.1;
    let hills: Vec<_> = (0..(area / TILES_PER_HILL).max(1)).map(|_| {
        let center = Vec2::new(rng.gen_range(0.0..size.0 as f64),
                               rng.gen_range(0.0..size.1 as f64));
        let sign = if rng.gen_bool(0.25) { -1. } else { 1. };
        let r: f64 = radius.sample(rng);
        (center, sign * height.sample(rng), r.max(1.))
    }).collect();

    let mut result = Matrix::new(size, 0.);
    for point in result.points() {
        let p = Vec2::new(point.0 as f64 + 0.5, point.1 as f64 + 0.5);
        let value: f64 = hills.iter().map(|&(center, h, r)| {
            let d = p - center;
            h * (-(d.x * d.x + d.y * d.y) / (2. * r * r)).exp()
        }).sum();
        let value = if value < WATER_LEVEL { f32::NEG_INFINITY } else { value as f32 };
        result.set(point, value);
    }

    for _ in 0..(area / TILES_PER_RIDGE) {
        let mut point = Point(rng.gen_range(0..size.0), rng.gen_range(0..size.1));
        let horizontal = rng.gen_bool(0.5);
        for _ in 0..RIDGE_LENGTH {
            if let Some(x) = result.entry_mut(point) {
                if x.is_finite() { *x += RIDGE_HEIGHT; }
            }
            let wobble = rng.gen_range(-1..=1);
            point += if horizontal { Point(1, wobble) } else { Point(wobble, 1) };
        }
    }
    Ok(result)
}

// The height sampler handed to the fog: the height of the tile under `world`.
pub fn height_at(heights: &Matrix<f32>, world: Vec2) -> f32 {
    let tile = Point((world.x / TILE_SIZE).floor() as i32, (world.y / TILE_SIZE).floor() as i32);
    heights.get(tile)
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generate() {
        let mut rng = RNG::seed_from_u64(17);
        let size = Point(40, 30);
        let heights = generate(size, &mut rng).unwrap();
        assert_eq!(heights.size, size);
        assert!(heights.data.iter().all(|x| !x.is_nan()));
        assert!(heights.data.iter().any(|&x| x > 0.));
    }

    #[test]
    fn test_height_at() {
        let mut heights = Matrix::new(Point(3, 2), 0.);
        heights.set(Point(2, 1), 7.);
        assert_eq!(height_at(&heights, Vec2::new(250., 150.)), 7.);
        assert_eq!(height_at(&heights, Vec2::new(250., 50.)), 0.);
        assert_eq!(height_at(&heights, Vec2::new(-10., 150.)), 0.);
    }
}
