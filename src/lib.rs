// src/lib.rs

//! A self-sustaining generative texture on a toroidal RGBA raster.
//!
//! Each [`pipeline::Pipeline::tick`] stamps discs from migrating attractors,
//! advances a life-like automaton whose alpha channel carries fading trails,
//! sorts low-alpha runs per row, feeds the result back as the next tick's
//! input, and smooths a copy through a mu-law codec and a 16-tap FIR filter
//! for presentation.

#![allow(clippy::needless_range_loop)]

pub mod attractor;
pub mod automaton;
pub mod error;
pub mod fir;
pub mod mulaw;
pub mod pipeline;
pub mod pixel_sort;
pub mod raster;
pub mod tuning;

pub use error::{Error, Result};
pub use pipeline::{FrameSink, Pipeline, SurfaceSize};
pub use raster::{Pixel, PixelBuffer};
pub use tuning::ControlPanel;
