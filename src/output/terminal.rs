//! Human-readable run reporting.
//!
//! The formatters return `String`s so the exact lines are testable; the
//! `print_*` wrappers are what the runner calls. Wording is not a contract —
//! the fields are.

use colored::Colorize;

use crate::config::{BenchConfig, BenchPlan};
use crate::statistics::Summary;
use crate::trial::TrialResult;
use crate::types::Direction;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Throughput in GiB/s, or `None` when the elapsed time rounds to zero.
fn gib_per_sec(total_bytes: u64, ns: u64) -> Option<f64> {
    if ns == 0 {
        return None;
    }
    Some((total_bytes as f64 / GIB) / (ns as f64 / 1e9))
}

fn fmt_gibs(total_bytes: u64, ns: u64) -> String {
    match gib_per_sec(total_bytes, ns) {
        Some(rate) => format!("{rate:.2} GiB/s"),
        None => "n/a".to_string(),
    }
}

/// Header line describing what a run is about to measure.
pub fn format_run_header(config: &BenchConfig, plan: BenchPlan) -> String {
    let what = match config.direction {
        Direction::Write => "Burst bulk-copy write",
        Direction::Read => "Burst bulk-copy read",
    };
    format!(
        "{} -> {}x{} @ {} B/px, {} frames, container {} bytes, {} trials",
        what.bold(),
        config.geometry.width,
        config.geometry.height,
        config.geometry.bytes_per_pixel,
        config.frame_count,
        plan.container_bytes,
        config.trials,
    )
}

/// One trial's totals, tagged when the values come from the burn-in pass.
pub fn format_trial(
    trial: u32,
    trials: u32,
    result: &TrialResult,
    plan: BenchPlan,
    burn_in: bool,
) -> String {
    let total_bytes = plan.container_bytes;
    let mut line = if burn_in {
        format!("{}: ", "Burn-in".dimmed())
    } else {
        format!("Trial {trial}/{trials}: ")
    };
    if let (Some(capture_ns), Some(convert_ns)) = (result.capture_ns, result.convert_ns) {
        line.push_str(&format!(
            "snap={:.3} ms | convert={:.3} ms | ",
            capture_ns as f64 / 1e6,
            convert_ns as f64 / 1e6,
        ));
    }
    line.push_str(&format!(
        "copy={:.3} ms | end-to-end={:.3} ms | remap={:.3} ms | remaps={} | copy-only={} | end-to-end={}",
        result.copy_ns as f64 / 1e6,
        result.end_to_end_ns as f64 / 1e6,
        result.remap_ns as f64 / 1e6,
        result.remaps,
        fmt_gibs(total_bytes, result.copy_ns),
        fmt_gibs(total_bytes, result.end_to_end_ns),
    ));
    line
}

/// Summary line for one metric, or a `no data` marker for an empty set.
pub fn format_summary(metric: &str, summary: Option<&Summary>) -> String {
    let Some(s) = summary else {
        return format!("Summary ({metric}): no data");
    };
    let outliers = if s.outliers.is_empty() {
        "none".to_string()
    } else {
        format!("trials {:?}", s.outliers).yellow().to_string()
    };
    format!(
        "Summary ({metric}): min={:.3} | max={:.3} | mean={:.3} | median={:.3} | std={:.3} | q1={:.3} | q3={:.3} | outliers={}",
        s.min, s.max, s.mean, s.median, s.std_dev, s.q1, s.q3, outliers,
    )
}

/// Print the run header.
pub fn print_run_header(config: &BenchConfig, plan: BenchPlan) {
    println!("{}", format_run_header(config, plan));
}

/// Print one trial line.
pub fn print_trial(trial: u32, trials: u32, result: &TrialResult, plan: BenchPlan, burn_in: bool) {
    println!("{}", format_trial(trial, trials, result, plan, burn_in));
}

/// Print one summary line.
pub fn print_summary(metric: &str, summary: Option<&Summary>) {
    println!("{}", format_summary(metric, summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::summarize;

    fn sample_result() -> TrialResult {
        TrialResult {
            copy_ns: 12_300_000,
            end_to_end_ns: 14_100_000,
            remap_ns: 1_200_000,
            remaps: 2,
            capture_ns: None,
            convert_ns: None,
        }
    }

    fn plan() -> BenchPlan {
        BenchPlan {
            frame_bytes: 1024,
            container_bytes: 1024 * 1024,
        }
    }

    #[test]
    fn trial_line_carries_every_field() {
        colored::control::set_override(false);
        let line = format_trial(2, 5, &sample_result(), plan(), false);
        assert!(line.starts_with("Trial 2/5:"));
        for needle in ["copy=12.300 ms", "end-to-end=14.100 ms", "remap=1.200 ms", "remaps=2"] {
            assert!(line.contains(needle), "missing {needle:?} in {line:?}");
        }
    }

    #[test]
    fn burn_in_line_is_tagged_not_numbered() {
        colored::control::set_override(false);
        let line = format_trial(1, 5, &sample_result(), plan(), true);
        assert!(line.starts_with("Burn-in:"));
        assert!(!line.contains("Trial"));
    }

    #[test]
    fn capture_fields_appear_only_when_present() {
        colored::control::set_override(false);
        let mut r = sample_result();
        assert!(!format_trial(1, 1, &r, plan(), false).contains("snap="));
        r.capture_ns = Some(5_000_000);
        r.convert_ns = Some(2_000_000);
        let line = format_trial(1, 1, &r, plan(), false);
        assert!(line.contains("snap=5.000 ms"));
        assert!(line.contains("convert=2.000 ms"));
    }

    #[test]
    fn empty_metric_reports_no_data() {
        assert_eq!(format_summary("Copy", None), "Summary (Copy): no data");
    }

    #[test]
    fn summary_line_includes_quartiles_and_outliers() {
        colored::control::set_override(false);
        let s = summarize(&[1.0, 1.0, 1.0, 1.0, 1.0, 100.0]).unwrap();
        let line = format_summary("Copy", Some(&s));
        assert!(line.contains("min=1.000"));
        assert!(line.contains("max=100.000"));
        assert!(line.contains("q1=1.000"));
        assert!(line.contains("outliers=trials [6]"));
    }

    #[test]
    fn zero_nanoseconds_never_divides() {
        assert_eq!(fmt_gibs(1024, 0), "n/a");
        assert_eq!(gib_per_sec(GIB as u64, 1_000_000_000), Some(1.0));
    }
}
