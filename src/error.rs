//! Error taxonomy for the harness.
//!
//! Two layers: [`ConfigError`] covers everything detectable before any I/O
//! happens, [`BenchError`] covers the run itself. Configuration and I/O
//! errors are fatal and propagate unchanged; there is no retry anywhere.
//! Drain-flush failures are deliberately *not* represented here — they are
//! logged and swallowed at the point of occurrence because they only affect
//! measurement isolation, never data integrity.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

/// A configuration rejected before any file is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A dimension or count that must be strictly positive was zero.
    #[error("{name} must be > 0")]
    NonPositive {
        /// Name of the offending field.
        name: &'static str,
    },

    /// The frame does not fit inside a single mapping window.
    #[error("frame size {frame_bytes} B exceeds the {max_window} B mapping window")]
    FrameExceedsWindow {
        /// Derived frame size in bytes.
        frame_bytes: u64,
        /// Configured window cap in bytes.
        max_window: u64,
    },

    /// Frame or container byte size does not fit in 64 bits.
    #[error("container byte size overflows a 64-bit range")]
    SizeOverflow,

    /// The acquisition source cannot synthesize frames at this pixel depth.
    #[error("capture mode supports 1, 2 or 4 B/px, got {bytes_per_pixel}")]
    UnsupportedPixelDepth {
        /// Configured pixel depth in bytes.
        bytes_per_pixel: u32,
    },
}

/// Any failure that aborts a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid configuration, surfaced before timing begins.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Container creation, truncation or mapping failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame access landed beyond the container. Contract violation.
    #[error("frame range [{offset}, +{len}) out of bounds for {container_bytes}-byte container")]
    OutOfRange {
        /// Requested byte offset.
        offset: u64,
        /// Requested length in bytes.
        len: u64,
        /// Container size the request was checked against.
        container_bytes: u64,
    },
}
