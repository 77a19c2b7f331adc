use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use slotmap::{DefaultKey, Key, KeyData};
use slotmap::hop::HopSlotMap;

use fow_base::base::{Matrix, Point, Vec2, Vec3, RNG};
use fow_base::config::{FogConfig, GridBounds, DEFAULT_SIGHT_RADIUS};
use fow_base::fog::{FogOfWar, FogStats, UnitId};
use fow_base::registry::ServiceRegistry;
use fow_base::watcher::VisibilityWatcher;

use crate::glyph::{Color, Glyph};
use crate::terrain::{self, TILE_SIZE};

//////////////////////////////////////////////////////////////////////////////

// Constants

const EYE_HEIGHT: f64 = 50.;
const UNIT_SPEED: f64 = 25.;
const MIN_SIGHT_RADIUS: f64 = 100.;
const SIGHT_RADIUS_STEP: f64 = 100.;
const THRESHOLD_STEP: f32 = 50.;

const FOG_FADE: f64 = 0.3;

pub type SharedFog = RefCell<FogOfWar>;

//////////////////////////////////////////////////////////////////////////////

// Unit ids

fn to_key(id: UnitId) -> DefaultKey {
    KeyData::from_ffi(id.0).into()
}

fn to_id(key: DefaultKey) -> UnitId {
    UnitId(key.data().as_ffi())
}

//////////////////////////////////////////////////////////////////////////////

// Units

struct Unit {
    pos: Vec2,
    target: Vec2,
}

impl Unit {
    fn new(extent: Vec2, rng: &mut RNG) -> Self {
        let pos = random_location(extent, rng);
        Self { pos, target: random_location(extent, rng) }
    }

    fn step(&mut self, extent: Vec2, rng: &mut RNG) {
        let delta = self.target - self.pos;
        let distance = (delta.x * delta.x + delta.y * delta.y).sqrt();
        if distance <= UNIT_SPEED {
            self.pos = self.target;
            self.target = random_location(extent, rng);
            return;
        }
        let scale = UNIT_SPEED / distance;
        self.pos = Vec2::new(self.pos.x + scale * delta.x, self.pos.y + scale * delta.y);
    }
}

fn random_location(extent: Vec2, rng: &mut RNG) -> Vec2 {
    Vec2::new(rng.gen_range(0.0..extent.x), rng.gen_range(0.0..extent.y))
}

//////////////////////////////////////////////////////////////////////////////

// World

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    AddUnit,
    RemoveUnit,
    RaiseThreshold,
    LowerThreshold,
    GrowSight,
    ShrinkSight,
}

pub struct WorldArgs {
    pub size: Point,
    pub units: usize,
    pub seed: Option<u64>,
}

pub struct World {
    size: Point,
    heights: Matrix<f32>,
    units: HopSlotMap<DefaultKey, Unit>,
    registry: ServiceRegistry,
    fog: Rc<SharedFog>,
    sight_radius: f64,
    beacon: Vec2,
    watcher: VisibilityWatcher,
    rng: RNG,
}

impl World {
    pub fn new(args: &WorldArgs) -> Result<Self, Box<dyn Error>> {
        let mut rng = args.seed.map(RNG::seed_from_u64).unwrap_or_else(RNG::from_entropy);
        let heights = terrain::generate(args.size, &mut rng)?;

        let extent = Vec2::new(TILE_SIZE * args.size.0 as f64, TILE_SIZE * args.size.1 as f64);
        let config = FogConfig {
            bounds: Some(GridBounds::new(Vec2::default(), extent)),
            tile_size: TILE_SIZE,
            ..Default::default()
        };
        let fog = FogOfWar::new(config, |x| terrain::height_at(&heights, x))?;

        let mut watcher = VisibilityWatcher::new();
        watcher.subscribe(|x| log::info!("Beacon {}", if x { "sighted" } else { "lost" }));

        let mut result = Self {
            size: args.size,
            heights,
            units: HopSlotMap::default(),
            registry: ServiceRegistry::new(),
            fog: Rc::new(RefCell::new(fog)),
            sight_radius: DEFAULT_SIGHT_RADIUS / 2.,
            beacon: Vec2::new(extent.x / 2., extent.y / 2.),
            watcher,
            rng,
        };

        // Units spawned before the fog is published register once it is.
        for _ in 0..args.units { result.add_unit(); }
        result.registry.publish(result.fog.clone());
        Ok(result)
    }

    pub fn stats(&self) -> FogStats { self.fog.borrow().stats() }

    pub fn visible_tiles(&self) -> usize { self.fog.borrow().grid().visible_tiles() }

    pub fn status(&self) -> String {
        let fog = self.fog.borrow();
        let threshold = fog.config().vision_blocking_delta_height_threshold;
        let beacon = if self.watcher.is_visible() { "seen" } else { "hidden" };
        format!("Units: {} / Sight: {} / Threshold: {} / Beacon: {}",
                self.units.len(), self.sight_radius, threshold, beacon)
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::AddUnit => self.add_unit(),
            Command::RemoveUnit => self.remove_unit(),
            Command::RaiseThreshold => self.adjust_threshold(THRESHOLD_STEP),
            Command::LowerThreshold => self.adjust_threshold(-THRESHOLD_STEP),
            Command::GrowSight => self.adjust_sight_radius(SIGHT_RADIUS_STEP),
            Command::ShrinkSight => self.adjust_sight_radius(-SIGHT_RADIUS_STEP),
        }
    }

    pub fn update(&mut self) {
        let extent = self.extent();
        for unit in self.units.values_mut() { unit.step(extent, &mut self.rng); }

        let (units, heights) = (&self.units, &self.heights);
        self.fog.borrow_mut().update(|id| {
            let Some(unit) = units.get(to_key(id)) else { return Vec3::default(); };
            let ground = terrain::height_at(heights, unit.pos) as f64;
            let ground = if ground.is_finite() { ground } else { 0. };
            Vec3::new(unit.pos.x, unit.pos.y, ground + EYE_HEIGHT)
        });
        self.watcher.update(&self.fog.borrow(), self.beacon);
    }

    pub fn render(&self, output: &mut Matrix<Glyph>) {
        if output.size != self.size { *output = Matrix::new(self.size, Glyph::default()); }
        let fog = self.fog.borrow();
        let grid = fog.grid();

        for point in self.heights.points() {
            let glyph = tile_glyph(self.heights.get(point));
            let glyph = if grid.tile_at(point).is_visible() { glyph } else {
                glyph.with_fg(glyph.fg().fade(FOG_FADE))
            };
            output.set(self.to_screen(point), glyph);
        }

        let beacon = grid.world_to_tile(self.beacon).filter(|_| self.watcher.is_visible());
        if let Some(tile) = beacon {
            output.set(self.to_screen(tile), Glyph::new('*', Color(0xff4040)));
        }
        for unit in self.units.values() {
            let Some(tile) = grid.world_to_tile(unit.pos) else { continue; };
            output.set(self.to_screen(tile), Glyph::new('@', Color(0xffff00)));
        }
    }

    // Private helpers

    fn extent(&self) -> Vec2 {
        Vec2::new(TILE_SIZE * self.size.0 as f64, TILE_SIZE * self.size.1 as f64)
    }

    // Screen rows run top to bottom; tile j runs bottom to top.
    fn to_screen(&self, tile: Point) -> Point {
        Point(tile.0, self.size.1 - 1 - tile.1)
    }

    fn add_unit(&mut self) {
        let unit = Unit::new(self.extent(), &mut self.rng);
        let id = to_id(self.units.insert(unit));
        let radius = self.sight_radius;
        self.registry.wait_for(move |fog: Rc<SharedFog>| { fog.borrow_mut().register(id, radius); });
    }

    fn remove_unit(&mut self) {
        let Some(key) = self.units.keys().next() else { return; };
        self.units.remove(key);
        self.fog.borrow_mut().unregister(to_id(key));
    }

    fn adjust_threshold(&mut self, delta: f32) {
        let mut fog = self.fog.borrow_mut();
        let threshold = fog.config().vision_blocking_delta_height_threshold + delta;
        if let Err(x) = fog.set_vision_blocking_threshold(threshold.max(0.)) {
            log::warn!("Rejected vision blocking threshold: {}", x);
        }
    }

    fn adjust_sight_radius(&mut self, delta: f64) {
        self.sight_radius = (self.sight_radius + delta).max(MIN_SIGHT_RADIUS);
        let mut fog = self.fog.borrow_mut();
        for key in self.units.keys() { fog.set_sight_radius(to_id(key), self.sight_radius); }
    }
}

fn tile_glyph(height: f32) -> Glyph {
    if !height.is_finite() { return Glyph::new('~', Color(0x4080ff)); }
    let shade = (96. + height.clamp(-100., 700.) / 5.) as u8;
    let ch = if height > 500. { '^' } else if height > 200. { 'n' } else { '.' };
    Glyph::new(ch, Color::gray(shade))
}

//////////////////////////////////////////////////////////////////////////////
