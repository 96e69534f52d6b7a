use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const MAX_SAMPLES: u64 = 10_000_000;

#[derive(Parser, Debug)]
#[command(name = "keycurve", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample a curve at evenly spaced times.
    Sample(SampleArgs),
    /// Sample a curve at the start of every frame in a range.
    Frames(FramesArgs),
    /// Load a curve, check it and print a summary.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input curve JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First sample time.
    #[arg(long, allow_hyphen_values = true)]
    from: f64,

    /// Last sample time (inclusive).
    #[arg(long, allow_hyphen_values = true)]
    to: f64,

    /// Time between samples.
    #[arg(long, default_value_t = 0.1)]
    step: f64,

    /// Print a JSON array of `[time, value]` pairs instead of text lines.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input curve JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frames per second, numerator.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Frames per second, denominator.
    #[arg(long, default_value_t = 1)]
    fps_den: u32,

    /// First frame (inclusive).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last frame (exclusive).
    #[arg(long)]
    end: u64,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input curve JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Sample(args) => cmd_sample(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    if !(args.step.is_finite() && args.step > 0.0) {
        anyhow::bail!("--step must be a positive number, got {}", args.step);
    }
    if !(args.from.is_finite() && args.to.is_finite()) || args.from > args.to {
        anyhow::bail!("--from must not exceed --to");
    }
    let curve = keycurve::Curve::from_path(&args.in_path)
        .with_context(|| format!("load curve '{}'", args.in_path.display()))?;

    // Index-based so rounding never drops or duplicates the last sample.
    let intervals = ((args.to - args.from) / args.step + 1e-9).floor();
    if intervals >= MAX_SAMPLES as f64 {
        anyhow::bail!(
            "range [{}, {}] with step {} needs more than {MAX_SAMPLES} samples",
            args.from,
            args.to,
            args.step
        );
    }
    let count = intervals as u64 + 1;
    let mut rows = Vec::with_capacity(count.min(1 << 16) as usize);
    for i in 0..count {
        let t = args.from + (i as f64) * args.step;
        rows.push((t, curve.sample(t)?));
    }

    let mut out = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer(&mut out, &rows).context("write samples")?;
        writeln!(out)?;
    } else {
        for (t, v) in rows {
            writeln!(out, "{t} {v}")?;
        }
    }
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let curve = keycurve::Curve::from_path(&args.in_path)
        .with_context(|| format!("load curve '{}'", args.in_path.display()))?;
    let fps = keycurve::Fps::new(args.fps, args.fps_den)?;
    let range = keycurve::FrameRange::new(
        keycurve::FrameIndex(args.start),
        keycurve::FrameIndex(args.end),
    )?;
    let opts = keycurve::EvalOpts {
        parallel: args.parallel,
        threads: args.threads,
    };
    let values = keycurve::sample_curve_frames(&curve, fps, range, &opts)?;

    let mut out = std::io::stdout().lock();
    for (f, v) in range.frames().zip(values) {
        writeln!(out, "{} {v}", f.0)?;
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let curve = keycurve::Curve::from_path(&args.in_path)
        .with_context(|| format!("load curve '{}'", args.in_path.display()))?;
    let json = curve.to_json_string()?;
    let reparsed = keycurve::Curve::from_json_str(&json)?;
    if reparsed != curve {
        anyhow::bail!("curve does not survive a JSON round trip");
    }

    match curve.time_range() {
        Some((first, last)) => println!(
            "ok: {} points, component {}, time range [{first}, {last}], pre {:?}, post {:?}",
            curve.len(),
            curve.component(),
            curve.pre_mapping(),
            curve.post_mapping()
        ),
        None => println!("ok: empty curve, component {}", curve.component()),
    }
    Ok(())
}
