// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A raster needs at least one pixel on each axis for wraparound to be defined.
    #[error("raster dimensions must be non-zero, got {width}x{height}")]
    EmptyRaster { width: usize, height: usize },

    #[error("invalid value for {flag}: {value:?}")]
    InvalidArgument { flag: &'static str, value: String },

    #[error("unknown flag {0:?}")]
    UnknownFlag(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("invalid control panel: {0}")]
    InvalidPanel(String),
}
