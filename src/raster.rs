// src/raster.rs
//
// Toroidal RGBA raster. Every coordinate access wraps on both axes, so
// neighbour lookups and disc stamps never see an edge.

use rayon::{prelude::*, slice::ChunksMut as ParChunksMut};

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Also the automaton state: 255 alive, 0 dead, anything between is a trail.
    pub a: u8,
}

impl Pixel {
    pub const TRANSPARENT: Pixel = Pixel::rgba(0, 0, 0, 0);
    pub const WHITE: Pixel = Pixel::rgba(255, 255, 255, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    w: usize,
    h: usize,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// Allocate a `w` x `h` raster of transparent black pixels.
    pub fn new(w: usize, h: usize) -> Result<Self> {
        check_dims(w, h)?;
        Ok(Self {
            w,
            h,
            pixels: vec![Pixel::TRANSPARENT; w * h],
        })
    }

    /// Reallocate to `w` x `h`, discarding the previous contents.
    /// A zero dimension is rejected and leaves the buffer as it was.
    pub fn resize(&mut self, w: usize, h: usize) -> Result<()> {
        check_dims(w, h)?;
        self.w = w;
        self.h = h;
        self.pixels.clear();
        self.pixels.resize(w * h, Pixel::TRANSPARENT);
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Row-major index of `(x, y)` after wrapping both coordinates.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        let x = wrap(x, self.w);
        let y = wrap(y, self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, p: Pixel) {
        let i = self.index(x, y);
        self.pixels[i] = p;
    }

    /// Overwrite this buffer with `src`. Both must have the same dimensions.
    pub fn copy_from(&mut self, src: &PixelBuffer) {
        assert_eq!(self.dims(), src.dims(), "raster dimension mismatch");
        self.pixels.copy_from_slice(&src.pixels);
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, Pixel> {
        self.pixels.chunks(self.w)
    }

    /// Mutable rows for stages that update each row independently.
    pub fn par_rows_mut(&mut self) -> ParChunksMut<'_, Pixel> {
        self.pixels.par_chunks_mut(self.w)
    }

    /// The alpha plane, row-major.
    pub fn alphas(&self) -> Vec<u8> {
        self.pixels.iter().map(|p| p.a).collect()
    }
}

#[inline]
fn wrap(v: i32, n: usize) -> usize {
    v.rem_euclid(n as i32) as usize
}

fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyRaster { width, height });
    }
    Ok(())
}
