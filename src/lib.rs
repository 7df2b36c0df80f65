//! # burstbench
//!
//! Latency probes for bulk memory-mapped frame I/O.
//!
//! A detector writes fixed-size frames back-to-back into one flat container
//! file. A single mapping may not cover more than ~2 GiB, so the container is
//! addressed through a sequence of bounded windows, managed so that no frame
//! ever straddles two mappings. This crate measures what that copy path
//! costs: per-frame bulk-copy time, end-to-end loop time, and the remap
//! overhead, across repeated trials with the usual measurement hygiene
//! (prefault, CPU warm-up, burn-in, drain between trials) and a summary with
//! IQR-based outlier flagging.
//!
//! ## Quick start
//!
//! ```ignore
//! use burstbench::{BenchConfig, FillPattern, TrialRunner};
//!
//! let config = BenchConfig::new(1020, 1020, 1000)
//!     .pattern(FillPattern::Random)
//!     .trials(5)
//!     .out_dir("/tmp/aps");
//! let report = TrialRunner::new(config)?.run()?;
//! for s in &report.summaries {
//!     println!("{}: {:?}", s.metric, s.summary);
//! }
//! ```
//!
//! Everything runs strictly sequentially on the calling thread: one trial at
//! a time, one frame at a time, one mapping window at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod error;
mod transfer;
mod trial;
mod types;
mod window;

// Functional modules
pub mod capture;
pub mod container;
pub mod output;
pub mod pattern;
pub mod statistics;

// Re-exports for the public API
pub use config::{BenchConfig, BenchPlan};
pub use constants::{DEFAULT_CPU_WARMUP, DEFAULT_DRAIN_SLEEP, MAX_WINDOW_BYTES, PAGE_BYTES};
pub use error::{BenchError, ConfigError, Result};
pub use pattern::FillPattern;
pub use statistics::{percentile, summarize, SampleSet, Summary};
pub use transfer::FrameTransfer;
pub use trial::{MetricSummary, Phase, PhasePlan, RunReport, TrialResult, TrialRunner};
pub use types::{Direction, FrameGeometry, ReadMode};
pub use window::{RemapStats, WindowedMapping};
