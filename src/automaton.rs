// src/automaton.rs
//
// Life-like rule over the alpha plane. A cell is alive when its alpha is 255;
// dead cells fade by a twentieth of their alpha per step and are tinted while
// they fade.

use rayon::prelude::*;

use crate::raster::{Pixel, PixelBuffer};

const ALIVE: u8 = 255;
const DECAY_DIVISOR: u8 = 20;

#[derive(Copy, Clone)]
pub struct LifeRule {
    survive_mask: u16,
    birth_mask: u16,
}

impl LifeRule {
    /// B3/S23.
    pub fn standard() -> Self {
        Self {
            survive_mask: (1 << 2) | (1 << 3),
            birth_mask: 1 << 3,
        }
    }

    #[inline]
    pub fn survive(&self, n: u32) -> bool {
        n <= 15 && (self.survive_mask & (1 << n)) != 0
    }

    #[inline]
    pub fn birth(&self, n: u32) -> bool {
        n <= 15 && (self.birth_mask & (1 << n)) != 0
    }

    #[inline]
    pub fn next_alive(&self, alive: bool, n: u32) -> bool {
        if alive { self.survive(n) } else { self.birth(n) }
    }
}

/// One fade step: `alpha - max(alpha / 20, 1)`, floored at zero.
#[inline]
pub fn decay(alpha: u8) -> u8 {
    let rate = (alpha / DECAY_DIVISOR).max(1);
    alpha.saturating_sub(rate)
}

/// Alpha of a cell after one step, given its own alpha and its live neighbour count.
#[inline]
pub fn next_alpha(rule: LifeRule, alpha: u8, neighbors: u32) -> u8 {
    if rule.next_alive(alpha == ALIVE, neighbors) {
        ALIVE
    } else {
        decay(alpha)
    }
}

pub struct CellularAutomaton {
    rule: LifeRule,
    accent: [u8; 3],
}

impl CellularAutomaton {
    pub fn new(accent: [u8; 3]) -> Self {
        Self {
            rule: LifeRule::standard(),
            accent,
        }
    }

    /// Colour purely by alpha tier: alive white, dead transparent, trails tinted.
    #[inline]
    pub fn recolor(&self, alpha: u8) -> Pixel {
        match alpha {
            ALIVE => Pixel::WHITE,
            0 => Pixel::TRANSPARENT,
            a => Pixel::rgba(self.accent[0], self.accent[1], self.accent[2], a),
        }
    }

    /// Live cells in the 8-neighbourhood of `(x, y)`, wrapping at the edges.
    pub fn live_neighbors(cur: &PixelBuffer, x: i32, y: i32) -> u32 {
        let mut sum = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                sum += (cur.get(x + dx, y + dy).a == ALIVE) as u32;
            }
        }
        sum - (cur.get(x, y).a == ALIVE) as u32
    }

    /// Compute the generation after `cur` into `next`.
    pub fn step(&self, next: &mut PixelBuffer, cur: &PixelBuffer) {
        assert_eq!(next.dims(), cur.dims(), "raster dimension mismatch");

        next.par_rows_mut()
            .enumerate()
            .for_each(|(y, nrow)| {
                let y = y as i32;
                for (x, out) in nrow.iter_mut().enumerate() {
                    let x = x as i32;
                    let n = Self::live_neighbors(cur, x, y);
                    let alpha = next_alpha(self.rule, cur.get(x, y).a, n);
                    *out = self.recolor(alpha);
                }
            });
    }
}
