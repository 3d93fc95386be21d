//! delve - dungeon layout generator
//!
//! Usage:
//!   delve --seed alpha                 Print a 40x40 layout as ASCII
//!   delve -s 12345 -W 80 -H 24 -f json Print the layout export as JSON
//!   delve --config tuning.json -m      Use custom options, show metrics

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use strum::Display;
use tracing::info;

use delve_core::{
    generate_with_config, parse_seed, validate, GameRng, GenerationResult, GeneratorConfig,
    LayoutExport, RepairMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
enum Format {
    /// Map symbols, one row per line
    Ascii,
    /// Row-major cell tags, features, teleports and rooms
    Json,
}

/// Deterministic dungeon layout generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Generate a connected dungeon layout", long_about = None)]
struct Args {
    /// Seed: a decimal integer or any text (random when omitted)
    #[arg(short = 's', long = "seed")]
    seed: Option<String>,

    /// Grid width
    #[arg(short = 'W', long = "width", default_value_t = 40)]
    width: usize,

    /// Grid height
    #[arg(short = 'H', long = "height", default_value_t = 40)]
    height: usize,

    /// JSON file with generator options
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Ascii)]
    format: Format,

    /// Leave unreachable rooms cut off instead of carving to them
    #[arg(long = "hidden-areas")]
    hidden_areas: bool,

    /// Absorb unreachable rooms instead of placing teleport pads
    #[arg(long = "no-teleport")]
    no_teleport: bool,

    /// Print phase timings and counters to stderr
    #[arg(short = 'm', long = "metrics")]
    metrics: bool,

    /// Verbose logging (repeat for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let seed = match &args.seed {
        Some(text) => parse_seed(text).with_context(|| format!("Bad seed {:?}", text))?,
        None => GameRng::from_entropy().seed(),
    };
    info!(seed, width = args.width, height = args.height, "generating");

    let result = generate_with_config(seed, args.width, args.height, &config)
        .context("Failed to generate layout")?;

    let violations = validate(&result);
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("invariant violated: {}", violation);
        }
        bail!("layout for seed {} broke {} invariant(s)", seed, violations.len());
    }

    print_result(&result, args.format)?;
    if args.metrics {
        eprintln!("seed {}", seed);
        eprint!("{}", result.metrics().summary());
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            GeneratorConfig::from_json(&text)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };
    if args.hidden_areas {
        config.repair_mode = RepairMode::HiddenArea;
    }
    if args.no_teleport {
        config.teleport_fallback = false;
    }
    config.collect_metrics = args.metrics;
    Ok(config)
}

fn print_result(result: &GenerationResult, format: Format) -> Result<()> {
    match format {
        Format::Ascii => {
            print!("{}", result.grid().render_ascii(Some(result.entrance())));
        }
        Format::Json => {
            let json = LayoutExport::from(result)
                .to_json_pretty()
                .with_context(|| format!("Failed to encode layout as {}", format))?;
            println!("{}", json);
        }
    }
    Ok(())
}
