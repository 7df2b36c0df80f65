//! Benchmark configuration and validation.
//!
//! A [`BenchConfig`] is built once, validated once, and never mutated during
//! a run. Validation happens before any file is created: a frame that cannot
//! fit a mapping window, a zero dimension, or a size that overflows 64 bits
//! all fail here with a [`ConfigError`] and zero I/O performed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BYTES_PER_PIXEL, DEFAULT_CPU_WARMUP, DEFAULT_DRAIN_SLEEP, DEFAULT_TRIALS,
    MAX_WINDOW_BYTES,
};
use crate::error::ConfigError;
use crate::pattern::FillPattern;
use crate::types::{Direction, FrameGeometry, ReadMode};

/// Immutable configuration for one benchmark run.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Frame pixel geometry.
    pub geometry: FrameGeometry,
    /// Frames in the container.
    pub frame_count: u64,
    /// Measured trials per run (burn-in excluded).
    pub trials: u32,
    /// Write frames in, or read them back.
    pub direction: Direction,
    /// Access mode for read runs.
    pub read_mode: ReadMode,
    /// Source-buffer content for write runs.
    pub pattern: FillPattern,
    /// Directory container files are created in.
    pub out_dir: PathBuf,
    /// Existing container to read; defaults to the standard name in
    /// `out_dir` when unset.
    pub input: Option<PathBuf>,
    /// Create a fresh container per trial instead of reusing one.
    pub rotate_containers: bool,
    /// Run the read-only page prefault phase before each trial.
    pub prefault: bool,
    /// Busy-loop duration of the CPU warm-up phase.
    pub cpu_warmup: Duration,
    /// Force a synchronous flush of dirty pages in the drain phases.
    pub drain_flush: bool,
    /// Sleep inserted after each drain flush.
    pub drain_sleep: Duration,
    /// Mapping window cap. The default is the production value; tests dial
    /// it down to force remaps on small files.
    pub max_window_bytes: u64,
    /// Seed for the `random` fill pattern. Unset means a fresh seed per run.
    pub seed: Option<u64>,
    /// Suppress per-trial terminal output.
    pub quiet: bool,
}

/// Sizes derived from a validated configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchPlan {
    /// Bytes per frame.
    pub frame_bytes: u64,
    /// Bytes in the whole container.
    pub container_bytes: u64,
}

impl BenchConfig {
    /// Configuration with the given geometry and all other fields at their
    /// defaults: 2 B/px, 5 trials, write direction, zero pattern, prefault
    /// and drain enabled.
    pub fn new(width: u32, height: u32, frame_count: u64) -> Self {
        Self {
            geometry: FrameGeometry {
                width,
                height,
                bytes_per_pixel: DEFAULT_BYTES_PER_PIXEL,
            },
            frame_count,
            trials: DEFAULT_TRIALS,
            direction: Direction::Write,
            read_mode: ReadMode::Copy,
            pattern: FillPattern::Zero,
            out_dir: PathBuf::from("/tmp/aps"),
            input: None,
            rotate_containers: false,
            prefault: true,
            cpu_warmup: DEFAULT_CPU_WARMUP,
            drain_flush: true,
            drain_sleep: DEFAULT_DRAIN_SLEEP,
            max_window_bytes: MAX_WINDOW_BYTES,
            seed: None,
            quiet: false,
        }
    }

    /// Set the pixel depth in bytes.
    pub fn bytes_per_pixel(mut self, bpp: u32) -> Self {
        self.geometry.bytes_per_pixel = bpp;
        self
    }

    /// Set the measured trial count.
    pub fn trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    /// Set the transfer direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the read access mode.
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// Set the source-buffer fill pattern.
    pub fn pattern(mut self, pattern: FillPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the container output directory.
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Read an explicit container path instead of the derived name.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(path.as_ref().to_path_buf());
        self
    }

    /// Toggle per-trial container rotation.
    pub fn rotate_containers(mut self, rotate: bool) -> Self {
        self.rotate_containers = rotate;
        self
    }

    /// Toggle the prefault phase.
    pub fn prefault(mut self, enabled: bool) -> Self {
        self.prefault = enabled;
        self
    }

    /// Set the CPU warm-up duration. `Duration::ZERO` skips the busy loop.
    pub fn cpu_warmup(mut self, warmup: Duration) -> Self {
        self.cpu_warmup = warmup;
        self
    }

    /// Configure the drain phases: whether to flush, and how long to sleep.
    pub fn drain(mut self, flush: bool, sleep: Duration) -> Self {
        self.drain_flush = flush;
        self.drain_sleep = sleep;
        self
    }

    /// Override the mapping window cap.
    pub fn max_window_bytes(mut self, bytes: u64) -> Self {
        self.max_window_bytes = bytes;
        self
    }

    /// Pin the seed of the `random` fill pattern.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Suppress per-trial terminal output.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Check every startup invariant and derive the byte sizes.
    ///
    /// Performs no I/O. Everything the run does afterwards may assume a
    /// frame fits a window and all sizes fit in `u64`.
    pub fn validate(&self) -> Result<BenchPlan, ConfigError> {
        for (name, value) in [
            ("width", self.geometry.width as u64),
            ("height", self.geometry.height as u64),
            ("bytesPerPixel", self.geometry.bytes_per_pixel as u64),
            ("frameCount", self.frame_count),
            ("trials", self.trials as u64),
            ("windowBytes", self.max_window_bytes),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositive { name });
            }
        }

        let frame_bytes = self
            .geometry
            .frame_bytes()
            .ok_or(ConfigError::SizeOverflow)?;
        if frame_bytes > self.max_window_bytes {
            return Err(ConfigError::FrameExceedsWindow {
                frame_bytes,
                max_window: self.max_window_bytes,
            });
        }

        let container_bytes = frame_bytes
            .checked_mul(self.frame_count)
            .ok_or(ConfigError::SizeOverflow)?;

        Ok(BenchPlan {
            frame_bytes,
            container_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let plan = BenchConfig::new(1020, 1020, 1000).validate().unwrap();
        assert_eq!(plan.frame_bytes, 2_080_800);
        assert_eq!(plan.container_bytes, 2_080_800_000);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        for cfg in [
            BenchConfig::new(0, 10, 10),
            BenchConfig::new(10, 0, 10),
            BenchConfig::new(10, 10, 0),
            BenchConfig::new(10, 10, 10).bytes_per_pixel(0),
            BenchConfig::new(10, 10, 10).trials(0),
        ] {
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::NonPositive { .. })
            ));
        }
    }

    #[test]
    fn oversized_frame_fails_fast_with_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BenchConfig::new(64, 1, 4)
            .bytes_per_pixel(1)
            .max_window_bytes(32)
            .out_dir(dir.path());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::FrameExceedsWindow {
                frame_bytes: 64,
                max_window: 32
            })
        );
        // Nothing was created: validation never touches the filesystem.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn frame_exactly_at_the_window_cap_is_accepted() {
        let cfg = BenchConfig::new(32, 1, 2)
            .bytes_per_pixel(1)
            .max_window_bytes(32);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn container_size_overflow_is_rejected() {
        let cfg = BenchConfig::new(u32::MAX, u32::MAX, u64::MAX).bytes_per_pixel(4);
        assert_eq!(cfg.validate(), Err(ConfigError::SizeOverflow));
    }
}
