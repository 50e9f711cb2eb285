/// Cloud cover index of a whole-sky photograph.
///
/// Reads the photograph's EXIF capture time, converts it to UTC with the
/// site's offset, runs the segmentation pipeline and prints one line:
///   year month day hour minute second jd lat lon elevation azimuth
///   threshold side votes cci
/// or, with `--json`, the same values as a JSON object.
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::{info, warn};
use serde::Serialize;
use skycover_core::imageio::{decode_file, encode_png};
use skycover_core::{
    read_capture_time, CivilTime, CoverError, CoverIndex, CoverParams, CoverPipeline, PixelBuffer, RunConfig,
    SiteInfo, Stage,
};

// ── Exit statuses ────────────────────────────────────────────────────────────

const EXIT_USAGE: u8 = 1;
const EXIT_INPUT: u8 = 2;
const EXIT_CONFIG: u8 = 3;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cloudcover", about = "Compute the cloud cover index of a whole-sky photograph")]
struct Args {
    /// Run configuration (JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the photograph cut to the mask as PNG
    #[arg(short, long)]
    trimmed: Option<PathBuf>,

    /// Write the smoothed sky/cloud segmentation as PNG
    #[arg(short, long)]
    segmented: Option<PathBuf>,

    /// Log filter, e.g. "info" or "skycover_core=debug" (RUST_LOG overrides)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the result as a JSON object instead of the 15-field line
    #[arg(long)]
    json: bool,

    /// Whole-sky photograph (JPEG with EXIF capture time)
    input: PathBuf,
}

/// Failures detected before the pipeline is configured.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read input {}", path.display())]
    Input { path: PathBuf, source: io::Error },
    #[error("cannot read configuration {}", path.display())]
    Config { path: PathBuf, source: io::Error },
    #[error("cannot read mask {}", path.display())]
    Mask { path: PathBuf, source: io::Error },
}

/// A usable input is a regular, non-empty file we are allowed to open.
fn check_readable(path: &Path) -> io::Result<()> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    if meta.len() == 0 {
        return Err(io::Error::other("file is empty"));
    }
    File::open(path).map(drop)
}

fn exit_status(err: &anyhow::Error) -> u8 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return match cli {
            CliError::Input { .. } => EXIT_INPUT,
            CliError::Config { .. } | CliError::Mask { .. } => EXIT_CONFIG,
        };
    }
    err.downcast_ref::<CoverError>().map_or(EXIT_USAGE, CoverError::exit_code)
}

fn init_logging(spec: &str) -> Result<LoggerHandle> {
    Logger::try_with_env_or_str(spec)
        .context("invalid log filter")?
        .log_to_stderr()
        .start()
        .context("logger initialization failed")
}

// ── Run ──────────────────────────────────────────────────────────────────────

/// Load the run configuration and check that the mask it names is readable.
fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let config = match path {
        Some(path) => {
            check_readable(path).map_err(|source| CliError::Config { path: path.to_path_buf(), source })?;
            RunConfig::load(path)?
        }
        None => {
            info!("no configuration given, using defaults");
            RunConfig::default()
        }
    };
    check_readable(&config.mask_file)
        .map_err(|source| CliError::Mask { path: config.mask_file.clone(), source })?;
    Ok(config)
}

fn load_site(config: &RunConfig) -> Result<SiteInfo> {
    match &config.location_file {
        Some(path) => {
            SiteInfo::load(path).with_context(|| format!("site description {}", path.display()))
        }
        None => {
            info!("no location file configured, using default site");
            Ok(SiteInfo::default())
        }
    }
}

fn save_stage(path: Option<&Path>, stage: Stage, buf: &PixelBuffer) {
    let Some(path) = path else { return };
    match encode_png(buf, path) {
        Ok(()) => info!("wrote {stage:?} image to {}", path.display()),
        Err(e) => warn!("could not write {stage:?} image: {:#}", anyhow::Error::new(e)),
    }
}

fn format_line(utc: &CivilTime, jd: f64, site: &SiteInfo, config: &RunConfig, index: &CoverIndex) -> String {
    format!(
        "{} {} {} {} {} {} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {} {} {:.6}",
        utc.year,
        utc.month,
        utc.day,
        utc.hour,
        utc.minute,
        utc.second,
        jd,
        site.latitude,
        site.longitude,
        site.elevation,
        config.azimuth,
        config.rb_threshold,
        config.convolution.side,
        config.convolution.votes,
        index.cci,
    )
}

#[derive(Serialize)]
struct Report<'a> {
    capture_utc: CivilTime,
    julian_date: f64,
    site: &'a SiteInfo,
    azimuth: f64,
    params: &'a CoverParams,
    index: &'a CoverIndex,
}

fn run(args: &Args) -> Result<String> {
    check_readable(&args.input).map_err(|source| CliError::Input { path: args.input.clone(), source })?;

    let config = load_config(args.config.as_deref())?;
    let site = load_site(&config)?;

    let capture = read_capture_time(&args.input)?;
    let utc = capture.to_utc(&site.timezone);
    let jd = utc.julian_date()?;
    info!("captured {} local, {} UTC (JD {:.6})", capture.local(), utc, jd);

    let photo = decode_file(&args.input)?;
    let mask = decode_file(&config.mask_file)
        .with_context(|| format!("mask {}", config.mask_file.display()))?;

    let pipeline = CoverPipeline::new(config.cover_params()?, config.category_table()?);
    let index = pipeline.run_with(photo, mask, |stage, buf| {
        let target = match stage {
            Stage::Cropped => args.trimmed.as_deref(),
            Stage::Segmented => args.segmented.as_deref(),
        };
        save_stage(target, stage, buf);
    })?;

    if args.json {
        let report = Report {
            capture_utc: utc,
            julian_date: jd,
            site: &site,
            azimuth: config.azimuth,
            params: pipeline.params(),
            index: &index,
        };
        return serde_json::to_string_pretty(&report).context("serializing report");
    }
    Ok(format_line(&utc, jd, &site, &config, &index))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(EXIT_USAGE) } else { ExitCode::SUCCESS };
        }
    };
    let _logger = match init_logging(&args.log_level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("cloudcover: {e:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(&args) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("cloudcover: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}
