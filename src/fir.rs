// src/fir.rs
//
// Causal 16-tap FIR over each colour channel of a raster, with the channel
// codes run through the mu-law codec on the way in and out.

use rayon::prelude::*;

use crate::{
    mulaw,
    raster::{Pixel, PixelBuffer},
};

pub const TAP_COUNT: usize = 16;

/// Lowpass impulse response (rePhase, 44.1 kHz design, 16 samples).
pub const FIR_TAPS: [f32; TAP_COUNT] = [
    0.0,
    0.0,
    1.68970842120652e-005,
    6.15592747384085e-005,
    0.000124200200736498,
    0.000147244644535557,
    0.000198803410079368,
    -0.000134472983763547,
    0.993202775999638,
    -0.00833025749144949,
    -0.00184265554280812,
    0.00201744723443938,
    0.00253410667543471,
    0.00133987606836959,
    0.000277913836081701,
    0.0,
];

/// `output[i] = sum over k of taps[k] * input[i - k]`, skipping `i - k < 0`.
///
/// The signal is not wrapped: the first 15 outputs see a partial window.
pub fn convolve(taps: &[f32; TAP_COUNT], input: &[f32], output: &mut [f32]) {
    assert_eq!(input.len(), output.len(), "signal length mismatch");

    output.par_iter_mut().enumerate().for_each(|(i, out)| {
        let mut acc = 0.0f32;
        for (k, &c) in taps.iter().enumerate().take(i + 1) {
            acc += c * input[i - k];
        }
        *out = acc;
    });
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline]
    fn read(self, p: Pixel) -> u8 {
        match self {
            Channel::Red => p.r,
            Channel::Green => p.g,
            Channel::Blue => p.b,
        }
    }

    #[inline]
    fn write(self, p: &mut Pixel, v: u8) {
        match self {
            Channel::Red => p.r = v,
            Channel::Green => p.g = v,
            Channel::Blue => p.b = v,
        }
    }
}

/// Colour scaled by its alpha fraction, truncating.
#[inline]
pub fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u16 * a as u16) / 255) as u8
}

pub struct FirSmoother {
    taps: [f32; TAP_COUNT],
    // Per-tick scratch; overwritten on every call to `smooth`.
    signal: Vec<f32>,
    filtered: Vec<f32>,
}

impl Default for FirSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl FirSmoother {
    pub fn new() -> Self {
        Self::with_taps(FIR_TAPS)
    }

    pub fn with_taps(taps: [f32; TAP_COUNT]) -> Self {
        Self {
            taps,
            signal: Vec::new(),
            filtered: Vec::new(),
        }
    }

    /// Smooth `src` into `dst`: premultiply, decode, convolve, re-encode.
    /// `dst` comes out fully opaque.
    pub fn smooth(&mut self, src: &PixelBuffer, dst: &mut PixelBuffer) {
        assert_eq!(src.dims(), dst.dims(), "raster dimension mismatch");

        let n = src.len();
        self.signal.resize(n, 0.0);
        self.filtered.resize(n, 0.0);

        for channel in Channel::ALL {
            self.signal
                .par_iter_mut()
                .zip(src.pixels().par_iter())
                .for_each(|(s, &p)| {
                    *s = mulaw::decode(premultiply(channel.read(p), p.a));
                });

            convolve(&self.taps, &self.signal, &mut self.filtered);

            dst.pixels_mut()
                .par_iter_mut()
                .zip(self.filtered.par_iter())
                .for_each(|(p, &v)| channel.write(p, mulaw::encode(v)));
        }

        dst.pixels_mut().par_iter_mut().for_each(|p| p.a = 255);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn impulse_reproduces_taps() {
        let mut input = vec![0.0f32; 40];
        input[0] = 1.0;
        let mut output = vec![f32::NAN; 40];
        convolve(&FIR_TAPS, &input, &mut output);

        assert_eq!(&output[..TAP_COUNT], &FIR_TAPS[..]);
        assert!(output[TAP_COUNT..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn delayed_impulse_shifts_response() {
        let mut input = vec![0.0f32; 24];
        input[5] = 1.0;
        let mut output = vec![0.0f32; 24];
        convolve(&FIR_TAPS, &input, &mut output);

        assert!(output[..5].iter().all(|&v| v == 0.0));
        assert_eq!(&output[5..5 + TAP_COUNT], &FIR_TAPS[..]);
    }

    #[test]
    fn window_does_not_wrap_at_signal_start() {
        let mut input = vec![0.0f32; 16];
        input[15] = 1.0;
        let mut output = vec![0.0f32; 16];
        convolve(&FIR_TAPS, &input, &mut output);

        // A toroidal window would leak input[15] into output[0..15].
        assert!(output[..15].iter().all(|&v| v == 0.0));
        assert_eq!(output[15], FIR_TAPS[0]);
    }

    #[test]
    fn premultiply_scales_by_alpha() {
        assert_eq!(premultiply(255, 255), 255);
        assert_eq!(premultiply(255, 0), 0);
        assert_eq!(premultiply(200, 128), 100);
        assert_eq!(premultiply(10, 254), 9);
    }

    #[test]
    fn smooth_forces_opaque_output() {
        let mut src = PixelBuffer::new(6, 4).unwrap();
        src.set(2, 1, Pixel::rgba(0, 255, 128, 120));
        src.set(4, 3, Pixel::WHITE);
        let mut dst = PixelBuffer::new(6, 4).unwrap();

        let mut fir = FirSmoother::new();
        fir.smooth(&src, &mut dst);
        assert!(dst.pixels().iter().all(|p| p.a == 255));
    }

    #[test]
    fn smoothing_delay_carries_across_rows() {
        let mut src = PixelBuffer::new(4, 3).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                src.set(x, y, Pixel::rgba(0xFF, 0xFF, 0xFF, 255));
            }
        }
        src.set(3, 0, Pixel::rgba(0x96, 0xFF, 0xFF, 255));
        let mut dst = PixelBuffer::new(4, 3).unwrap();
        FirSmoother::new().smooth(&src, &mut dst);

        // The 0.9932 tap sits 8 samples in, so the code reappears two rows down.
        let reds: Vec<u8> = dst.pixels().iter().map(|p| p.r).collect();
        let mut expected = vec![0xFF; 12];
        expected[11] = 0x96;
        assert_eq!(reds, expected);
        assert!(dst.pixels().iter().all(|p| p.g == 0xFF && p.b == 0xFF));
    }

    #[test]
    fn identity_taps_round_trip_codec() {
        let mut taps = [0.0f32; TAP_COUNT];
        taps[0] = 1.0;
        let mut fir = FirSmoother::with_taps(taps);

        let mut src = PixelBuffer::new(3, 2).unwrap();
        src.set(0, 0, Pixel::rgba(0x96, 0x16, 0x86, 255));
        src.set(1, 0, Pixel::rgba(0x96, 0x96, 0x96, 0));
        let mut dst = PixelBuffer::new(3, 2).unwrap();
        fir.smooth(&src, &mut dst);

        // Stable codes survive decode then encode untouched.
        assert_eq!(dst.get(0, 0), Pixel::rgba(0x96, 0x16, 0x86, 255));
        // Fully transparent colour premultiplies to code 0, the most negative amplitude.
        assert_eq!(dst.get(1, 0), Pixel::rgba(0, 0, 0, 255));
        // Transparent black stays code 0 as well.
        assert_eq!(dst.get(2, 1), Pixel::rgba(0, 0, 0, 255));
    }
}
