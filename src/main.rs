//! CLI for the burst container latency probes.
//!
//! ```bash
//! # Write 1000 frames of 1020x1020 @ 16-bit into one container, 5 trials
//! burstbench --mode write
//!
//! # Read them back with the bulk-copy probe
//! burstbench --mode read --read-mode copy
//!
//! # Bound the zero-copy read cost instead
//! burstbench --mode read --read-mode touch
//!
//! # Acquisition-driven run against the synthetic camera
//! burstbench --mode capture --width 512 --height 512 --frames 100
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;

use burstbench::capture::SyntheticCamera;
use burstbench::output::json;
use burstbench::{BenchConfig, Direction, FillPattern, ReadMode, TrialRunner};

/// Memory-mapped burst I/O latency probes for frame containers.
#[derive(Parser, Debug)]
#[command(name = "burstbench")]
#[command(about = "Measure bulk-copy latency into a window-mapped frame container")]
#[command(version)]
struct Args {
    /// ROI width in pixels
    #[arg(long, default_value_t = 1020)]
    width: u32,

    /// ROI height in pixels
    #[arg(long, default_value_t = 1020)]
    height: u32,

    /// Number of frames in the container
    #[arg(long, default_value_t = 1000)]
    frames: u64,

    /// Pixel depth in bytes (1 for 8-bit, 2 for 16-bit)
    #[arg(long, default_value_t = 2)]
    bytes_per_pixel: u32,

    /// Measured trials (one extra burn-in pass always runs)
    #[arg(long, default_value_t = 5)]
    trials: u32,

    /// What to measure: write, read, or capture
    #[arg(short, long, default_value = "write")]
    mode: String,

    /// Read access mode: copy (bulk get) or touch (one byte per page)
    #[arg(long, default_value = "copy")]
    read_mode: String,

    /// Source-buffer pattern: zero, random, ramp, alt
    #[arg(long, default_value = "zero")]
    pattern: String,

    /// Directory container files are created in
    #[arg(short, long, default_value = "/tmp/aps")]
    out_dir: PathBuf,

    /// Existing container to read (read mode); defaults to the standard
    /// name under --out-dir
    #[arg(long)]
    input: Option<PathBuf>,

    /// Create a fresh container per trial
    #[arg(long)]
    rotate: bool,

    /// Skip the read-only page prefault phase
    #[arg(long)]
    no_prefault: bool,

    /// Skip the flush+sleep drain around the measured phase
    #[arg(long)]
    no_drain: bool,

    /// Deterministic seed for the random pattern
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run report as pretty JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let (direction, capture) = match args.mode.as_str() {
        "write" => (Direction::Write, false),
        "read" => (Direction::Read, false),
        "capture" => (Direction::Write, true),
        other => {
            eprintln!("Unknown mode '{other}'. Available: write, read, capture");
            process::exit(2);
        }
    };
    let Some(read_mode) = ReadMode::parse(&args.read_mode) else {
        eprintln!("Unknown read mode '{}'. Available: copy, touch", args.read_mode);
        process::exit(2);
    };
    let Some(pattern) = FillPattern::parse(&args.pattern) else {
        eprintln!(
            "Unknown pattern '{}'. Available: zero, random, ramp, alt",
            args.pattern
        );
        process::exit(2);
    };

    let mut config = BenchConfig::new(args.width, args.height, args.frames)
        .bytes_per_pixel(args.bytes_per_pixel)
        .trials(args.trials)
        .direction(direction)
        .read_mode(read_mode)
        .pattern(pattern)
        .out_dir(&args.out_dir)
        .rotate_containers(args.rotate)
        .prefault(!args.no_prefault);
    if args.no_drain {
        config = config.drain(false, std::time::Duration::ZERO);
    }
    if let Some(input) = &args.input {
        config = config.input(input);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    if let Err(err) = run(config, capture, args.json.as_deref()) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(
    config: BenchConfig,
    capture: bool,
    json_path: Option<&std::path::Path>,
) -> burstbench::Result<()> {
    // Surface configuration errors before any directory or file is touched.
    config.validate()?;
    if config.direction == Direction::Write {
        std::fs::create_dir_all(&config.out_dir)?;
    }

    let mut runner = if capture {
        let camera = SyntheticCamera::new(config.geometry)?;
        TrialRunner::with_source(config, Box::new(camera))?
    } else {
        TrialRunner::new(config)?
    };

    let report = runner.run()?;
    if let Some(path) = json_path {
        json::write_report(path, &report)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
