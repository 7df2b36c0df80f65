//! Trial orchestration: the phase state machine and the trial loop.
//!
//! Each trial walks a fixed phase sequence:
//!
//! ```text
//! Prefault -> CpuWarmup -> BurnIn -> DrainBeforeMeasured
//!          -> MeasuredTrial -> DrainAfterMeasured -> Done
//! ```
//!
//! Prefault and the two drain phases are optional; which ones run is decided
//! once per run by a [`PhasePlan`] and encoded in [`Phase::next`], so the
//! isolation strategy is testable without timing anything. Only
//! `MeasuredTrial` contributes to the sample sets; burn-in runs the identical
//! loop to absorb one-time costs and its timings are printed but discarded.
//! Trials run strictly sequentially on the calling thread — no background
//! I/O, no cancellation; a trial either completes or the run fails.

use std::hint::black_box;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::capture::FrameSource;
use crate::config::{BenchConfig, BenchPlan};
use crate::constants::PAGE_BYTES;
use crate::container::{container_file_name, Container};
use crate::error::Result;
use crate::output::terminal;
use crate::statistics::{SampleSet, Summary};
use crate::transfer::FrameTransfer;
use crate::types::{Direction, FrameGeometry, ReadMode};
use crate::window::WindowedMapping;

/// Phases of one trial, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Read-only page touches across the whole container, faulting pages in
    /// without dirtying them.
    Prefault,
    /// Fixed-duration busy loop to settle clocks and frequency scaling.
    CpuWarmup,
    /// One untimed-for-the-record pass of the measured loop.
    BurnIn,
    /// Optional flush + sleep so earlier writeback does not bleed into the
    /// measured phase.
    DrainBeforeMeasured,
    /// The timed frame loop whose totals enter the sample sets.
    MeasuredTrial,
    /// Optional flush + sleep so this trial's writeback does not bleed into
    /// the next one.
    DrainAfterMeasured,
    /// Terminal state.
    Done,
}

/// Which optional phases a run enables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhasePlan {
    /// Run the prefault phase.
    pub prefault: bool,
    /// Run the drain phases.
    pub drain: bool,
}

impl Phase {
    /// Entry state of a trial under `plan`.
    pub fn first(plan: PhasePlan) -> Phase {
        if plan.prefault {
            Phase::Prefault
        } else {
            Phase::CpuWarmup
        }
    }

    /// Successor state under `plan`. `Done` is absorbing.
    pub fn next(self, plan: PhasePlan) -> Phase {
        match self {
            Phase::Prefault => Phase::CpuWarmup,
            Phase::CpuWarmup => Phase::BurnIn,
            Phase::BurnIn => {
                if plan.drain {
                    Phase::DrainBeforeMeasured
                } else {
                    Phase::MeasuredTrial
                }
            }
            Phase::DrainBeforeMeasured => Phase::MeasuredTrial,
            Phase::MeasuredTrial => {
                if plan.drain {
                    Phase::DrainAfterMeasured
                } else {
                    Phase::Done
                }
            }
            Phase::DrainAfterMeasured => Phase::Done,
            Phase::Done => Phase::Done,
        }
    }
}

/// Totals measured for one trial.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct TrialResult {
    /// Sum of per-frame bulk-copy (or touch) times.
    pub copy_ns: u64,
    /// Wall-clock time of the whole frame loop, remaps included.
    pub end_to_end_ns: u64,
    /// Time spent creating mapping windows inside the loop.
    pub remap_ns: u64,
    /// Windows created inside the loop.
    pub remaps: u32,
    /// Sum of per-frame acquisition times (capture runs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_ns: Option<u64>,
    /// Sum of per-frame pixel-conversion times (capture runs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_ns: Option<u64>,
}

/// One metric's summary in the final report.
#[derive(Clone, Debug, Serialize)]
pub struct MetricSummary {
    /// Metric name as printed (`Copy`, `End2End`, `Remap`, ...).
    pub metric: &'static str,
    /// Summary across measured trials; `None` when no trial reported.
    pub summary: Option<Summary>,
}

/// Everything a run produced, for reporting and JSON export.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Frame pixel geometry.
    pub geometry: FrameGeometry,
    /// Frames per container.
    pub frame_count: u64,
    /// Bytes per frame.
    pub frame_bytes: u64,
    /// Bytes per container.
    pub container_bytes: u64,
    /// Transfer direction.
    pub direction: Direction,
    /// Read access mode (meaningful for read runs).
    pub read_mode: ReadMode,
    /// Whether frames came from an acquisition source.
    pub capture: bool,
    /// Measured trial totals, in trial order.
    pub trials: Vec<TrialResult>,
    /// Per-metric summaries.
    pub summaries: Vec<MetricSummary>,
}

/// Per-metric sample sets accumulated across measured trials.
#[derive(Debug, Default)]
struct RunSamples {
    copy_ms: SampleSet,
    end_to_end_ms: SampleSet,
    remap_ms: SampleSet,
    capture_ms: SampleSet,
    convert_ms: SampleSet,
}

/// Drives the phase sequence for every trial of a run.
pub struct TrialRunner {
    config: BenchConfig,
    plan: BenchPlan,
    source: Option<Box<dyn FrameSource>>,
    src_buf: Vec<u8>,
    read_buf: Vec<u8>,
    pixel_buf: Vec<u8>,
}

impl TrialRunner {
    /// Runner fed from a prefilled pattern buffer (or reading back).
    ///
    /// Validates the configuration; nothing is created on disk until
    /// [`TrialRunner::run`].
    pub fn new(config: BenchConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Runner whose write loop pulls each frame from an acquisition source.
    pub fn with_source(config: BenchConfig, source: Box<dyn FrameSource>) -> Result<Self> {
        Self::build(config, Some(source))
    }

    fn build(config: BenchConfig, source: Option<Box<dyn FrameSource>>) -> Result<Self> {
        let plan = config.validate()?;
        let frame_bytes = plan.frame_bytes as usize;

        let mut src_buf = Vec::new();
        if source.is_none() && config.direction == Direction::Write {
            let seed = config.seed.unwrap_or_else(|| rand::rng().random());
            src_buf = vec![0u8; frame_bytes];
            config.pattern.fill(&mut src_buf, seed);
        }
        let read_buf = if config.direction == Direction::Read {
            vec![0u8; frame_bytes]
        } else {
            Vec::new()
        };

        Ok(Self {
            config,
            plan,
            source,
            src_buf,
            read_buf,
            pixel_buf: Vec::new(),
        })
    }

    /// Sizes derived from the validated configuration.
    pub fn plan(&self) -> BenchPlan {
        self.plan
    }

    fn phase_plan(&self) -> PhasePlan {
        PhasePlan {
            prefault: self.config.prefault,
            drain: self.config.drain_flush || !self.config.drain_sleep.is_zero(),
        }
    }

    fn container_path(&self, trial: u32) -> std::path::PathBuf {
        let suffix = self.config.rotate_containers.then_some(trial);
        self.config.out_dir.join(container_file_name(
            self.config.geometry,
            self.config.frame_count,
            suffix,
        ))
    }

    fn acquire_container(&self, trial: u32) -> Result<Container> {
        match self.config.direction {
            Direction::Write => {
                Container::create(&self.container_path(trial), self.plan.container_bytes)
            }
            Direction::Read => {
                let path = match &self.config.input {
                    Some(path) => path.clone(),
                    None => self.container_path(trial),
                };
                Container::open_readonly(&path, self.plan.container_bytes)
            }
        }
    }

    /// Run every trial and summarize.
    ///
    /// Containers are created (write) or opened (read) lazily per trial when
    /// rotation is on, otherwise once. Each trial's totals are printed as
    /// they complete unless the configuration is quiet.
    pub fn run(&mut self) -> Result<RunReport> {
        let trials = self.config.trials;
        let mut samples = RunSamples::default();
        let mut results = Vec::with_capacity(trials as usize);
        let mut container: Option<Container> = None;

        if !self.config.quiet {
            terminal::print_run_header(&self.config, self.plan);
        }

        for trial in 1..=trials {
            if container.is_none() || self.config.rotate_containers {
                let next = self.acquire_container(trial)?;
                container = Some(next);
            }
            let c = container.as_ref().expect("container acquired above");

            let result = self.run_trial(c, trial)?;
            samples.copy_ms.push(result.copy_ns as f64 / 1e6);
            samples.end_to_end_ms.push(result.end_to_end_ns as f64 / 1e6);
            samples.remap_ms.push(result.remap_ns as f64 / 1e6);
            if let Some(ns) = result.capture_ns {
                samples.capture_ms.push(ns as f64 / 1e6);
            }
            if let Some(ns) = result.convert_ns {
                samples.convert_ms.push(ns as f64 / 1e6);
            }
            if !self.config.quiet {
                terminal::print_trial(trial, trials, &result, self.plan, false);
            }
            results.push(result);
        }
        info!("run complete: {} measured trials", results.len());

        let mut summaries = Vec::new();
        if self.source.is_some() {
            summaries.push(MetricSummary {
                metric: "Snap",
                summary: samples.capture_ms.summarize(),
            });
            summaries.push(MetricSummary {
                metric: "Convert",
                summary: samples.convert_ms.summarize(),
            });
        }
        summaries.push(MetricSummary {
            metric: "Copy",
            summary: samples.copy_ms.summarize(),
        });
        summaries.push(MetricSummary {
            metric: "End2End",
            summary: samples.end_to_end_ms.summarize(),
        });
        summaries.push(MetricSummary {
            metric: "Remap",
            summary: samples.remap_ms.summarize(),
        });

        if !self.config.quiet {
            for s in &summaries {
                terminal::print_summary(s.metric, s.summary.as_ref());
            }
        }

        Ok(RunReport {
            geometry: self.config.geometry,
            frame_count: self.config.frame_count,
            frame_bytes: self.plan.frame_bytes,
            container_bytes: self.plan.container_bytes,
            direction: self.config.direction,
            read_mode: self.config.read_mode,
            capture: self.source.is_some(),
            trials: results,
            summaries,
        })
    }

    /// Walk the phase machine once.
    fn run_trial(&mut self, container: &Container, trial: u32) -> Result<TrialResult> {
        let plan = self.phase_plan();
        let writable = self.config.direction == Direction::Write;
        let mut mapping = WindowedMapping::with_max_window(
            container.file(),
            container.len(),
            writable,
            self.config.max_window_bytes,
        );

        let mut measured = None;
        let mut phase = Phase::first(plan);
        while phase != Phase::Done {
            match phase {
                Phase::Prefault => self.prefault(container)?,
                Phase::CpuWarmup => cpu_warmup(self.config.cpu_warmup),
                Phase::BurnIn => {
                    let result = self.frame_loop(&mut mapping)?;
                    if !self.config.quiet {
                        terminal::print_trial(trial, self.config.trials, &result, self.plan, true);
                    }
                }
                Phase::DrainBeforeMeasured | Phase::DrainAfterMeasured => self.drain(&mapping),
                Phase::MeasuredTrial => measured = Some(self.frame_loop(&mut mapping)?),
                Phase::Done => unreachable!(),
            }
            phase = phase.next(plan);
        }

        match measured {
            Some(result) => Ok(result),
            None => unreachable!("every phase plan passes through MeasuredTrial"),
        }
    }

    /// The loop both BurnIn and MeasuredTrial execute.
    fn frame_loop(&mut self, mapping: &mut WindowedMapping<'_>) -> Result<TrialResult> {
        mapping.reset_stats();
        let frame_bytes = self.plan.frame_bytes as usize;
        let mut transfer = FrameTransfer::new(mapping, frame_bytes);

        let mut copy_ns = 0u64;
        let mut capture_ns = 0u64;
        let mut convert_ns = 0u64;
        let capture = self.source.is_some();

        let loop_start = Instant::now();
        for index in 0..self.config.frame_count {
            match self.config.direction {
                Direction::Write => {
                    if let Some(source) = self.source.as_mut() {
                        let t0 = Instant::now();
                        let pixels = source.capture_frame()?;
                        let t1 = Instant::now();
                        pixels.write_le_bytes(&mut self.pixel_buf);
                        convert_ns += t1.elapsed().as_nanos() as u64;
                        capture_ns += (t1 - t0).as_nanos() as u64;
                        if self.pixel_buf.len() != frame_bytes {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!(
                                    "source delivered {} bytes, frame is {}",
                                    self.pixel_buf.len(),
                                    frame_bytes
                                ),
                            )
                            .into());
                        }
                        copy_ns += transfer.write_frame(index, &self.pixel_buf)?;
                    } else {
                        copy_ns += transfer.write_frame(index, &self.src_buf)?;
                    }
                }
                Direction::Read => match self.config.read_mode {
                    ReadMode::Copy => copy_ns += transfer.read_frame(index, &mut self.read_buf)?,
                    ReadMode::Touch => copy_ns += transfer.touch_frame(index)?,
                },
            }
        }
        let end_to_end_ns = loop_start.elapsed().as_nanos() as u64;

        let stats = mapping.stats();
        Ok(TrialResult {
            copy_ns,
            end_to_end_ns,
            remap_ns: stats.remap_ns,
            remaps: stats.remaps,
            capture_ns: capture.then_some(capture_ns),
            convert_ns: capture.then_some(convert_ns),
        })
    }

    /// Read-only touch of one byte per page across the whole container.
    ///
    /// Uses its own read-only manager, dropped on return, so no read-write
    /// window exists while it runs and no page is dirtied.
    fn prefault(&self, container: &Container) -> Result<()> {
        let mut ro = WindowedMapping::with_max_window(
            container.file(),
            container.len(),
            false,
            self.config.max_window_bytes,
        );
        let mut acc = 0u8;
        let mut offset = 0u64;
        while offset < container.len() {
            let span = (container.len() - offset).min(self.config.max_window_bytes);
            let pos = ro.ensure_window(offset, span)?;
            let window = ro.slice(pos, span as usize);
            let mut p = 0;
            while p < window.len() {
                acc ^= window[p];
                p += PAGE_BYTES;
            }
            offset += span;
        }
        black_box(acc);
        Ok(())
    }

    /// Flush dirty pages and pause. Failure to flush only degrades
    /// measurement isolation, so it is logged and swallowed.
    fn drain(&self, mapping: &WindowedMapping<'_>) {
        if self.config.drain_flush {
            if let Err(err) = mapping.flush_active() {
                warn!("drain flush failed (ignored): {err}");
            }
        }
        if !self.config.drain_sleep.is_zero() {
            thread::sleep(self.config.drain_sleep);
        }
    }
}

/// Busy-loop for `duration`, giving frequency scaling and clock sources a
/// data-independent workload to settle on before timing starts.
fn cpu_warmup(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let deadline = Instant::now() + duration;
    let mut acc: u64 = 0x9E37_79B9_7F4A_7C15;
    while Instant::now() < deadline {
        acc = black_box(
            acc.wrapping_mul(0x5851_F42D_4C95_7F2D)
                .wrapping_add(0x1405_7B7E_F767_814F),
        );
    }
    black_box(acc);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: PhasePlan = PhasePlan {
        prefault: true,
        drain: true,
    };

    fn sequence(plan: PhasePlan) -> Vec<Phase> {
        let mut phases = Vec::new();
        let mut phase = Phase::first(plan);
        while phase != Phase::Done {
            phases.push(phase);
            phase = phase.next(plan);
        }
        phases
    }

    #[test]
    fn full_plan_walks_every_phase_in_order() {
        assert_eq!(
            sequence(ALL),
            vec![
                Phase::Prefault,
                Phase::CpuWarmup,
                Phase::BurnIn,
                Phase::DrainBeforeMeasured,
                Phase::MeasuredTrial,
                Phase::DrainAfterMeasured,
            ]
        );
    }

    #[test]
    fn optional_phases_drop_out_of_the_sequence() {
        let no_prefault = PhasePlan {
            prefault: false,
            drain: true,
        };
        assert_eq!(
            sequence(no_prefault),
            vec![
                Phase::CpuWarmup,
                Phase::BurnIn,
                Phase::DrainBeforeMeasured,
                Phase::MeasuredTrial,
                Phase::DrainAfterMeasured,
            ]
        );

        let no_drain = PhasePlan {
            prefault: true,
            drain: false,
        };
        assert_eq!(
            sequence(no_drain),
            vec![
                Phase::Prefault,
                Phase::CpuWarmup,
                Phase::BurnIn,
                Phase::MeasuredTrial,
            ]
        );
    }

    #[test]
    fn every_plan_reaches_measured_exactly_once() {
        for prefault in [false, true] {
            for drain in [false, true] {
                let plan = PhasePlan { prefault, drain };
                let seq = sequence(plan);
                assert_eq!(
                    seq.iter()
                        .filter(|&&p| p == Phase::MeasuredTrial)
                        .count(),
                    1
                );
                // BurnIn always directly precedes the drain/measured block.
                let burn = seq.iter().position(|&p| p == Phase::BurnIn).unwrap();
                let measured = seq.iter().position(|&p| p == Phase::MeasuredTrial).unwrap();
                assert!(burn < measured);
            }
        }
    }

    #[test]
    fn done_is_absorbing() {
        assert_eq!(Phase::Done.next(ALL), Phase::Done);
    }

    #[test]
    fn cpu_warmup_zero_returns_immediately() {
        let t0 = Instant::now();
        cpu_warmup(Duration::ZERO);
        assert!(t0.elapsed() < Duration::from_millis(50));
    }
}
