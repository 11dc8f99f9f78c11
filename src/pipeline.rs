// src/pipeline.rs
//
// One tick: attractor discs -> automaton step -> run sort -> feedback swap ->
// mu-law/FIR smoothing into the presented frame.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    attractor::PatternGenerator,
    automaton::CellularAutomaton,
    error::Result,
    fir::FirSmoother,
    pixel_sort::PixelSorter,
    raster::PixelBuffer,
    tuning::ControlPanel,
};

/// Presentation surface size in physical pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Receives the finished frame once per tick. The frame is only borrowed for
/// the duration of the call; implementations copy what they need.
pub trait FrameSink {
    fn present(&mut self, frame: &PixelBuffer);
}

/// The three rasters, always allocated together from one size.
struct Boards {
    /// Input of the next automaton step (board A).
    seed: PixelBuffer,
    /// Output of the automaton step (board B).
    next: PixelBuffer,
    /// Smoothed copy handed to the sink.
    frame: PixelBuffer,
}

impl Boards {
    fn new(w: usize, h: usize) -> Result<Self> {
        Ok(Self {
            seed: PixelBuffer::new(w, h)?,
            next: PixelBuffer::new(w, h)?,
            frame: PixelBuffer::new(w, h)?,
        })
    }
}

pub struct Pipeline {
    panel: ControlPanel,
    rng: StdRng,

    surface: SurfaceSize,
    boards: Option<Boards>,

    generator: PatternGenerator,
    automaton: CellularAutomaton,
    sorter: PixelSorter,
    smoother: FirSmoother,

    ticks: u64,
}

impl Pipeline {
    pub fn new(panel: ControlPanel) -> Self {
        let rng = StdRng::seed_from_u64(panel.rng_seed);
        Self {
            rng,
            surface: SurfaceSize::default(),
            boards: None,
            generator: PatternGenerator::new(panel.circle_count, 1, 1),
            automaton: CellularAutomaton::new(panel.accent),
            sorter: PixelSorter::new(panel.sort_threshold),
            smoother: FirSmoother::new(),
            ticks: 0,
            panel,
        }
    }

    /// Run one frame for a surface of the given size and hand it to `sink`.
    ///
    /// Returns `false` without touching any state when the surface maps to an
    /// empty raster (minimised window, or smaller than one scaled pixel).
    pub fn tick<S: FrameSink + ?Sized>(&mut self, surface: SurfaceSize, sink: &mut S) -> bool {
        let (w, h) = self.panel.raster_size(surface.width, surface.height);
        if w == 0 || h == 0 {
            debug!(
                "skipping tick for {}x{} surface (raster {w}x{h})",
                surface.width, surface.height
            );
            return false;
        }

        if (self.boards.is_none() || surface != self.surface) && !self.resize(surface) {
            return false;
        }

        let Some(b) = self.boards.as_mut() else {
            return false;
        };

        self.generator.iterate(&mut b.seed, &mut self.rng);
        self.automaton.step(&mut b.next, &b.seed);
        self.sorter.sort(&mut b.next);
        std::mem::swap(&mut b.seed, &mut b.next);
        self.smoother.smooth(&b.seed, &mut b.frame);

        sink.present(&b.frame);
        self.ticks += 1;
        true
    }

    /// Reallocate every board for `surface` and park the attractors at the new
    /// midpoint. All automaton state is dropped. Returns `false` for a surface
    /// that maps to an empty raster, leaving the current boards in place.
    pub fn resize(&mut self, surface: SurfaceSize) -> bool {
        let (w, h) = self.panel.raster_size(surface.width, surface.height);
        let boards = match Boards::new(w, h) {
            Ok(b) => b,
            Err(e) => {
                debug!("not resizing to {}x{}: {e}", surface.width, surface.height);
                return false;
            }
        };
        self.boards = Some(boards);
        self.generator.recenter(w, h);
        self.surface = surface;
        info!(
            "surface {}x{} -> raster {w}x{h}, attractor radius {}",
            surface.width,
            surface.height,
            self.generator.radius()
        );
        true
    }

    /// Current raster size, once a surface has been seen.
    pub fn raster_size(&self) -> Option<(usize, usize)> {
        self.boards.as_ref().map(|b| b.seed.dims())
    }

    /// The board the next tick starts from (the sorted automaton output).
    pub fn seed_board(&self) -> Option<&PixelBuffer> {
        self.boards.as_ref().map(|b| &b.seed)
    }

    /// The last smoothed frame.
    pub fn frame(&self) -> Option<&PixelBuffer> {
        self.boards.as_ref().map(|b| &b.frame)
    }

    pub fn generator(&self) -> &PatternGenerator {
        &self.generator
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
