// src/attractor.rs
//
// Migrating circle attractors. Each circle glides toward a random target and
// stamps an opaque white disc every tick; once integer truncation stalls the
// glide, a new target is drawn.

use log::debug;
use rand::Rng;

use crate::raster::{Pixel, PixelBuffer};

/// Fixed-point blend: 980/1000 of the current position, 20/1000 of the target.
const KEEP_PERMILLE: i64 = 980;
const PULL_PERMILLE: i64 = 20;
const PERMILLE: i64 = 1000;

/// Disc radius is the larger raster extent over this divisor.
pub const RADIUS_DIVISOR: usize = 28;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Circle {
    pub last_position: Point,
    pub position: Point,
    pub desired_position: Point,
}

impl Circle {
    fn at(p: Point) -> Self {
        Self {
            last_position: p,
            position: p,
            desired_position: p,
        }
    }

    #[inline]
    pub fn converged(&self) -> bool {
        self.position == self.last_position
    }

    /// Record the current position as `last` and blend toward the target.
    fn advance(&mut self) {
        self.last_position = self.position;
        self.position = Point::new(
            blend(self.position.x, self.desired_position.x),
            blend(self.position.y, self.desired_position.y),
        );
    }
}

#[inline]
fn blend(cur: i32, target: i32) -> i32 {
    ((cur as i64 * KEEP_PERMILLE + target as i64 * PULL_PERMILLE) / PERMILLE) as i32
}

pub fn radius_for(w: usize, h: usize) -> i32 {
    (w.max(h) / RADIUS_DIVISOR).max(1) as i32
}

pub struct PatternGenerator {
    circles: Vec<Circle>,
    radius: i32,
    w: usize,
    h: usize,
}

impl PatternGenerator {
    pub fn new(count: usize, w: usize, h: usize) -> Self {
        let mut g = Self {
            circles: vec![Circle::at(Point::default()); count],
            radius: 1,
            w,
            h,
        };
        g.recenter(w, h);
        g
    }

    /// Park every circle at the raster midpoint and size the disc for `w` x `h`.
    pub fn recenter(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.radius = radius_for(w, h);
        let mid = Point::new((w / 2) as i32, (h / 2) as i32);
        for c in &mut self.circles {
            *c = Circle::at(mid);
        }
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Move every circle one tick and stamp its disc into `buf`.
    pub fn iterate<R: Rng + ?Sized>(&mut self, buf: &mut PixelBuffer, rng: &mut R) {
        debug_assert_eq!(buf.dims(), (self.w, self.h));

        let w = self.w.max(1);
        let h = self.h.max(1);
        for (i, c) in self.circles.iter_mut().enumerate() {
            if c.converged() {
                c.desired_position = Point::new(
                    rng.random_range(0..w) as i32,
                    rng.random_range(0..h) as i32,
                );
                debug!(
                    "attractor {i} retargeted ({}, {}) -> ({}, {})",
                    c.position.x, c.position.y, c.desired_position.x, c.desired_position.y
                );
            }
            c.advance();
            stamp_disc(buf, c.position, self.radius);
        }
    }
}

/// Filled disc `dx² + dy² <= r²`, written through toroidal addressing.
pub fn stamp_disc(buf: &mut PixelBuffer, center: Point, radius: i32) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            buf.set(center.x + dx, center.y + dy, Pixel::WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use test_log::test;

    #[test]
    fn radius_tracks_larger_extent() {
        assert_eq!(radius_for(280, 100), 10);
        assert_eq!(radius_for(100, 560), 20);
        assert_eq!(radius_for(10, 10), 1);
        assert_eq!(radius_for(1, 1), 1);
    }

    #[test]
    fn new_generator_sits_at_midpoint() {
        let g = PatternGenerator::new(3, 101, 40);
        assert_eq!(g.circles().len(), 3);
        for c in g.circles() {
            assert_eq!(c.position, Point::new(50, 20));
            assert!(c.converged());
        }
    }

    #[test]
    fn blend_truncates_fixed_point() {
        assert_eq!(blend(0, 1000), 20);
        assert_eq!(blend(100, 0), 98);
        // Stalls once the pull is below one lattice step.
        assert_eq!(blend(10, 20), 10);
    }

    #[test]
    fn converged_circle_gets_new_target_then_moves() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buf = PixelBuffer::new(200, 200).unwrap();
        let mut g = PatternGenerator::new(1, 200, 200);

        g.iterate(&mut buf, &mut rng);
        let c = g.circles()[0];
        assert_eq!(c.last_position, Point::new(100, 100));
        assert!(c.desired_position.x >= 0 && c.desired_position.x < 200);
        assert!(c.desired_position.y >= 0 && c.desired_position.y < 200);
        assert_eq!(c.position.x, blend(100, c.desired_position.x));
        assert_eq!(c.position.y, blend(100, c.desired_position.y));
    }

    #[test]
    fn target_is_kept_while_moving() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut buf = PixelBuffer::new(64, 64).unwrap();
        let mut g = PatternGenerator::new(1, 64, 64);
        g.circles[0].desired_position = Point::new(0, 0);
        g.circles[0].last_position = Point::new(1, 1);

        g.iterate(&mut buf, &mut rng);
        let c = g.circles()[0];
        assert_eq!(c.desired_position, Point::new(0, 0));
        assert_eq!(c.position, Point::new(31, 31));
    }

    #[test]
    fn disc_matches_circle_inequality() {
        let mut buf = PixelBuffer::new(9, 9).unwrap();
        stamp_disc(&mut buf, Point::new(4, 4), 2);
        let lit = buf.pixels().iter().filter(|p| **p == Pixel::WHITE).count();
        // 5x5 square minus the four corners.
        assert_eq!(lit, 21);
        assert_eq!(buf.get(4, 2), Pixel::WHITE);
        assert_eq!(buf.get(2, 2), Pixel::TRANSPARENT);
    }

    #[test]
    fn disc_wraps_across_edges() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        stamp_disc(&mut buf, Point::new(0, 0), 1);
        for (x, y) in [(0, 0), (1, 0), (9, 0), (0, 1), (0, 9)] {
            assert_eq!(buf.get(x, y), Pixel::WHITE, "({x}, {y})");
        }
        assert_eq!(buf.get(9, 9), Pixel::TRANSPARENT);
    }
}
