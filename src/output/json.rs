//! JSON export of the run report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::trial::RunReport;

/// Serialize a run report to a compact JSON string.
pub fn to_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a run report to a pretty-printed JSON string.
pub fn to_json_pretty(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write a pretty-printed run report to `path`.
pub fn write_report(path: &Path, report: &RunReport) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, report).map_err(io::Error::from)?;
    w.write_all(b"\n")?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::summarize;
    use crate::trial::{MetricSummary, TrialResult};
    use crate::types::{Direction, FrameGeometry, ReadMode};

    fn sample_report() -> RunReport {
        RunReport {
            geometry: FrameGeometry {
                width: 4,
                height: 1,
                bytes_per_pixel: 1,
            },
            frame_count: 2,
            frame_bytes: 4,
            container_bytes: 8,
            direction: Direction::Write,
            read_mode: ReadMode::Copy,
            capture: false,
            trials: vec![TrialResult {
                copy_ns: 1000,
                end_to_end_ns: 2000,
                remap_ns: 500,
                remaps: 1,
                capture_ns: None,
                convert_ns: None,
            }],
            summaries: vec![MetricSummary {
                metric: "Copy",
                summary: summarize(&[0.001]),
            }],
        }
    }

    #[test]
    fn report_serializes_with_expected_fields() {
        let json = to_json(&sample_report()).unwrap();
        for needle in [
            "\"direction\":\"write\"",
            "\"frame_bytes\":4",
            "\"remaps\":1",
            "\"metric\":\"Copy\"",
            "\"median\":0.001",
        ] {
            assert!(json.contains(needle), "missing {needle} in {json}");
        }
        // capture buckets are omitted, not null, for plain runs
        assert!(!json.contains("capture_ns"));
    }

    #[test]
    fn pretty_output_parses_back() {
        let pretty = to_json_pretty(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(value["trials"][0]["copy_ns"], 1000);
        assert_eq!(value["summaries"][0]["summary"]["min"], 0.001);
    }

    #[test]
    fn write_report_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &sample_report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
    }
}
