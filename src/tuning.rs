// src/tuning.rs
//
// This file is the CONTROL PANEL.
// Every knob the pipeline and the window loop read lives here; the algorithms
// themselves keep their fixed constants (blend weights, decay divisor, FIR taps).

use crate::{
    error::{Error, Result},
    pixel_sort::DEFAULT_THRESHOLD,
};

#[derive(Clone, Debug, PartialEq)]
pub struct ControlPanel {
    /// Seed for attractor target picks. Same seed, same texture.
    pub rng_seed: u64,

    /// Surface pixels per raster pixel on each axis. The raster is the window
    /// size divided by this, then stretched back up by the blit.
    pub pixel_scale: u32,

    /// Number of migrating attractor circles.
    pub circle_count: usize,

    /// Alpha at or below which a pixel marks a pixel-sort run boundary.
    pub sort_threshold: u8,

    /// Tint of decaying trail cells (alpha strictly between 0 and 255).
    pub accent: [u8; 3],

    /// Pipeline ticks per second in the window loop.
    pub ticks_per_second: f32,

    /// Log frame/tick rates and process load once per second.
    pub debug: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            rng_seed: 0xC0FFEE_1234_5678,
            pixel_scale: 4,
            circle_count: 4,
            sort_threshold: DEFAULT_THRESHOLD,
            accent: [0, 255, 128],
            ticks_per_second: 60.0,
            debug: false,
        }
    }
}

impl ControlPanel {
    /// Defaults overridden by command-line flags (program name already skipped).
    ///
    /// Flags: `--debug`, `--seed N`, `--scale N`, `--circles N`,
    /// `--threshold N`, `--tps F`.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut panel = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg = arg.as_ref().to_lowercase();
            match arg.as_str() {
                "--debug" => panel.debug = true,
                "--seed" => panel.rng_seed = value(&mut args, "--seed")?,
                "--scale" => panel.pixel_scale = value(&mut args, "--scale")?,
                "--circles" => panel.circle_count = value(&mut args, "--circles")?,
                "--threshold" => panel.sort_threshold = value(&mut args, "--threshold")?,
                "--tps" => panel.ticks_per_second = value(&mut args, "--tps")?,
                _ => return Err(Error::UnknownFlag(arg)),
            }
        }

        panel.validate()?;
        Ok(panel)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_scale == 0 {
            return Err(Error::InvalidPanel("pixel_scale must be at least 1".into()));
        }
        if !(self.ticks_per_second.is_finite() && self.ticks_per_second > 0.0) {
            return Err(Error::InvalidPanel(format!(
                "ticks_per_second must be positive, got {}",
                self.ticks_per_second
            )));
        }
        Ok(())
    }

    /// Raster dimensions for a surface of `width` x `height` pixels.
    #[inline]
    pub fn raster_size(&self, width: u32, height: u32) -> (usize, usize) {
        let s = self.pixel_scale.max(1);
        ((width / s) as usize, (height / s) as usize)
    }
}

fn value<I, S, T>(args: &mut I, flag: &'static str) -> Result<T>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
    T: std::str::FromStr,
{
    let raw = args.next().ok_or(Error::MissingValue(flag))?;
    let raw = raw.as_ref();
    raw.parse().map_err(|_| Error::InvalidArgument {
        flag,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn no_args_gives_defaults() {
        let panel = ControlPanel::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(panel, ControlPanel::default());
    }

    #[test]
    fn flags_override_defaults() {
        let panel = ControlPanel::from_args([
            "--debug", "--seed", "42", "--scale", "2", "--circles", "7", "--threshold", "80",
            "--TPS", "30",
        ])
        .unwrap();
        assert!(panel.debug);
        assert_eq!(panel.rng_seed, 42);
        assert_eq!(panel.pixel_scale, 2);
        assert_eq!(panel.circle_count, 7);
        assert_eq!(panel.sort_threshold, 80);
        assert_eq!(panel.ticks_per_second, 30.0);
    }

    #[test]
    fn bad_values_are_reported() {
        assert_eq!(
            ControlPanel::from_args(["--scale"]),
            Err(Error::MissingValue("--scale"))
        );
        assert_eq!(
            ControlPanel::from_args(["--threshold", "300"]),
            Err(Error::InvalidArgument {
                flag: "--threshold",
                value: "300".into()
            })
        );
        assert!(matches!(
            ControlPanel::from_args(["--scale", "0"]),
            Err(Error::InvalidPanel(_))
        ));
    }

    #[test]
    fn unknown_flag_is_named() {
        let err = ControlPanel::from_args(["--debug", "--Frobnicate"]).unwrap_err();
        assert_eq!(err, Error::UnknownFlag("--frobnicate".into()));
        assert_eq!(err.to_string(), r#"unknown flag "--frobnicate""#);
    }

    #[test]
    fn raster_size_divides_surface() {
        let panel = ControlPanel::default();
        assert_eq!(panel.raster_size(512, 512), (128, 128));
        assert_eq!(panel.raster_size(1281, 721), (320, 180));
        assert_eq!(panel.raster_size(3, 400), (0, 100));
    }
}
