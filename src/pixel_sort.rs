// src/pixel_sort.rs
//
// Row-wise run sort. Low-alpha pixels act as markers; the span between two
// consecutive markers in a row is sorted by descending alpha.

use rayon::prelude::*;

use crate::raster::{Pixel, PixelBuffer};

pub const DEFAULT_THRESHOLD: u8 = 100;

#[derive(Copy, Clone, Debug)]
pub struct PixelSorter {
    threshold: u8,
}

impl Default for PixelSorter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl PixelSorter {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Sort every run in one row. The closing marker of a run is not
    /// reused as the opening marker of the next; an unclosed run stays as is.
    pub fn sort_row(&self, row: &mut [Pixel]) {
        let mut start: Option<usize> = None;
        for x in 0..row.len() {
            if row[x].a > self.threshold {
                continue;
            }
            match start.take() {
                None => start = Some(x),
                Some(s) => row[s..x].sort_by(|a, b| b.a.cmp(&a.a)),
            }
        }
    }

    pub fn sort(&self, buf: &mut PixelBuffer) {
        buf.par_rows_mut().for_each(|row| self.sort_row(row));
    }
}
