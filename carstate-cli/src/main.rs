//! BYD Car State Replay CLI
//!
//! Replays a recorded frame log through the carstate-decoder library and
//! prints one decoded vehicle state per control tick as JSON lines.

use anyhow::{Context, Result};
use carstate_decoder::signals::dbc::parse_dbc_file;
use carstate_decoder::{CanSignalSource, CarStateConfig, DbcCatalog, SpeedKalmanFilter, StateDecoder};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod replay;

use config::{AppConfig, InputConfig, ReplayConfig};
use replay::Replay;

/// CarState Replay - Decode a recorded frame log into vehicle states
#[derive(Parser, Debug)]
#[command(name = "carstate-cli")]
#[command(about = "Decode recorded BYD CAN frames into vehicle states", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (carstate.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the DBC file
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Path to the JSON-lines frame log
    #[arg(short, long, value_name = "FILE")]
    frames: Option<PathBuf>,

    /// Vehicle variant (e.g. BYD_ATTO3)
    #[arg(long, value_name = "NAME")]
    variant: Option<String>,

    /// Decode blind-spot monitoring signals
    #[arg(long)]
    bsm: bool,

    /// Control loop rate in Hz
    #[arg(long, value_name = "HZ")]
    tick_hz: Option<u32>,

    /// Output file for decoded states (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CarState Replay CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", carstate_decoder::VERSION);

    let config = resolve_config(&args)?;
    run(&config)
}

/// Merge the optional config file with command line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            let (Some(dbc), Some(frames)) = (&args.dbc, &args.frames) else {
                anyhow::bail!("Either --config or both --dbc and --frames are required");
            };
            let Some(variant) = &args.variant else {
                anyhow::bail!("No vehicle variant configured (use --variant or [car] in the config)");
            };
            AppConfig {
                input: InputConfig {
                    dbc: dbc.clone(),
                    frames: frames.clone(),
                },
                car: CarStateConfig::new(variant.as_str()),
                replay: ReplayConfig::default(),
            }
        }
    };

    if let Some(dbc) = &args.dbc {
        config.input.dbc = dbc.clone();
    }
    if let Some(frames) = &args.frames {
        config.input.frames = frames.clone();
    }
    if let Some(variant) = &args.variant {
        config.car.variant = variant.clone();
    }
    if args.bsm {
        config.car.enable_bsm = true;
    }
    if let Some(tick_hz) = args.tick_hz {
        if tick_hz == 0 {
            anyhow::bail!("--tick-hz must be greater than zero");
        }
        config.replay.tick_hz = tick_hz;
    }
    if args.output.is_some() {
        config.replay.output = args.output.clone();
    }

    Ok(config)
}

fn run(config: &AppConfig) -> Result<()> {
    let variant = config.car.vehicle_variant()?;

    log::info!("Loading DBC: {:?}", config.input.dbc);
    let database = parse_dbc_file(&config.input.dbc)
        .with_context(|| format!("Failed to load DBC: {:?}", config.input.dbc))?;
    let stats = database.stats();
    log::info!(
        "Signal database: {} messages, {} signals, {} value tables",
        stats.num_messages,
        stats.num_signals,
        stats.num_value_tables
    );

    let catalog = DbcCatalog::from_database(variant, &database);
    let mut decoder = StateDecoder::new(config.car.clone(), &catalog)?;
    let mut source = CanSignalSource::new(database);
    decoder.subscribe(&mut source)?;
    let mut estimator = SpeedKalmanFilter::new();

    let input = File::open(&config.input.frames)
        .with_context(|| format!("Failed to open frame log: {:?}", config.input.frames))?;
    let reader = BufReader::new(input);

    let mut writer: Box<dyn Write> = match &config.replay.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    log::info!(
        "Replaying {:?} as {} (blind spot monitor: {}) at {} Hz",
        config.input.frames,
        decoder.variant(),
        decoder.config().enable_bsm,
        config.replay.tick_hz
    );
    let stats = Replay::new(&mut decoder, &mut source, &mut estimator, config.replay.tick_hz)
        .run(reader, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Done: {} frames ({} decoded, {} skipped lines), {} ticks",
        stats.frames,
        stats.consumed,
        stats.skipped_lines,
        stats.ticks
    );

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_config() {
        let args = Args::parse_from([
            "carstate-cli",
            "--dbc",
            "pt.dbc",
            "--frames",
            "drive.jsonl",
            "--variant",
            "BYD_ATTO3",
            "--bsm",
            "--tick-hz",
            "50",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.input.dbc, PathBuf::from("pt.dbc"));
        assert_eq!(config.car.variant, "BYD_ATTO3");
        assert!(config.car.enable_bsm);
        assert_eq!(config.replay.tick_hz, 50);
    }

    #[test]
    fn test_missing_variant_rejected() {
        let args = Args::parse_from(["carstate-cli", "--dbc", "pt.dbc", "--frames", "drive.jsonl"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let args = Args::parse_from(["carstate-cli", "--variant", "BYD_ATTO3"]);
        assert!(resolve_config(&args).is_err());
    }
}
