use std::ops::{Index, IndexMut};

//////////////////////////////////////////////////////////////////////////////

// Basics

#[macro_export]
macro_rules! static_assert_size {
    ($x:ty, $y:expr) => {
        const _: fn() = || { let _ = std::mem::transmute::<$x, [u8; $y]>; };
    }
}

pub type HashSet<K> = fxhash::FxHashSet<K>;
pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;

pub type RNG = rand::rngs::StdRng;

//////////////////////////////////////////////////////////////////////////////

// World-space vectors

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 { pub x: f64, pub y: f64 }

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 { pub x: f64, pub y: f64, pub z: f64 }

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    pub fn xy(&self) -> Vec2 { Vec2 { x: self.x, y: self.y } }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 { Vec2::new(self.x + other.x, self.y + other.y) }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 { Vec2::new(self.x - other.x, self.y - other.y) }
}

impl std::ops::Add<f64> for Vec2 {
    type Output = Vec2;
    fn add(self, other: f64) -> Vec2 { Vec2::new(self.x + other, self.y + other) }
}

impl std::ops::Sub<f64> for Vec2 {
    type Output = Vec2;
    fn sub(self, other: f64) -> Vec2 { Vec2::new(self.x - other, self.y - other) }
}

//////////////////////////////////////////////////////////////////////////////

// Point

// A tile coordinate: Point(i, j), where i runs along world x and j along y.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Point(pub i32, pub i32);
static_assert_size!(Point, 8);

impl Point {
    pub fn len_taxicab(&self) -> i32 {
        self.0.abs() + self.1.abs()
    }

    pub fn len_l2_squared(&self) -> i64 {
        let (x, y) = (self.0 as i64, self.1 as i64);
        x * x + y * y
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point(self.0 + other.0, self.1 + other.1)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point(self.0 - other.0, self.1 - other.1)
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, other: Point) {
        self.0 += other.0;
        self.1 += other.1;
    }
}

//////////////////////////////////////////////////////////////////////////////

// Matrix

// Storage is i-major: the cell at Point(i, j) lives at i * size.1 + j.
#[derive(Clone, Default)]
pub struct Matrix<T> {
    pub data: Vec<T>,
    pub size: Point,
    pub default: T,
}

// SAFETY: Non-none index() results are always valid indices into data.
impl<T: Clone> Matrix<T> {
    pub fn new(size: Point, value: T) -> Self {
        assert!(0 <= size.0);
        assert!(0 <= size.1);
        let mut data = Vec::new();
        data.resize(size.0 as usize * size.1 as usize, value.clone());
        Self { data, size, default: value }
    }

    pub fn get(&self, point: Point) -> T {
        let Some(x) = self.index(point) else { return self.default.clone(); };
        unsafe { self.data.get_unchecked(x).clone() }
    }

    pub fn set(&mut self, point: Point, value: T) {
        let Some(x) = self.index(point) else { return; };
        unsafe { *self.data.get_unchecked_mut(x) = value; }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn entry_mut(&mut self, point: Point) -> Option<&mut T> {
        let Some(x) = self.index(point) else { return None; };
        unsafe { Some(self.data.get_unchecked_mut(x)) }
    }

    pub fn len(&self) -> usize { self.data.len() }

    #[inline(always)]
    pub fn contains(&self, point: Point) -> bool {
        let Point(px, py) = point;
        let Point(sx, sy) = self.size;
        0 <= px && px < sx && 0 <= py && py < sy
    }

    #[inline(always)]
    pub fn index(&self, point: Point) -> Option<usize> {
        if !self.contains(point) { return None; }
        Some(point.0 as usize * self.size.1 as usize + point.1 as usize)
    }

    pub fn points(&self) -> impl Iterator<Item = Point> {
        let Point(sx, sy) = self.size;
        (0..sx).flat_map(move |i| (0..sy).map(move |j| Point(i, j)))
    }
}

impl<T: Clone> Index<Point> for Matrix<T> {
    type Output = T;
    fn index(&self, point: Point) -> &Self::Output {
        let index = Matrix::<T>::index(self, point);
        let Some(x) = index else { panic!("{:?} outside of {:?}", point, self.size) };
        &self.data[x]
    }
}

impl<T: Clone> IndexMut<Point> for Matrix<T> {
    fn index_mut(&mut self, point: Point) -> &mut Self::Output {
        let index = Matrix::<T>::index(self, point);
        let Some(x) = index else { panic!("{:?} outside of {:?}", point, self.size) };
        &mut self.data[x]
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_i_major() {
        let mut matrix = Matrix::new(Point(3, 4), 0);
        matrix.set(Point(1, 2), 7);
        assert_eq!(matrix.index(Point(1, 2)), Some(6));
        assert_eq!(matrix.data[6], 7);
        assert_eq!(matrix[Point(1, 2)], 7);
    }

    #[test]
    fn test_matrix_out_of_bounds() {
        let matrix = Matrix::new(Point(2, 2), 5);
        assert!(matrix.index(Point(-1, 0)).is_none());
        assert!(matrix.index(Point(0, 2)).is_none());
        assert_eq!(matrix.get(Point(2, 0)), 5);
        assert_eq!(matrix.points().count(), 4);
    }

    #[test]
    #[should_panic]
    fn test_matrix_index_panics_outside() {
        let matrix = Matrix::new(Point(2, 2), 0);
        let _ = matrix[Point(2, 2)];
    }
}
