//! # Hard Division Entry Point
//!
//! Generates a level from the command line and prints it as ASCII or JSON.

use clap::Parser;
use hard_division::{
    Autopilot, DivisionError, DivisionResult, GenerationConfig, LevelContext, MapStrategy,
};
use log::{info, LevelFilter};
use serde::Serialize;
use std::path::PathBuf;

/// Command line arguments for the level generator.
#[derive(Parser, Debug)]
#[command(name = "hard-division")]
#[command(about = "Generates grid roguelike levels with guaranteed reachable stairs")]
#[command(version)]
struct Args {
    /// Random seed for generation (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// Map height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Map carving strategy
    #[arg(long, value_enum)]
    strategy: Option<MapStrategy>,

    /// Level number; drives enemy count and pickup points
    #[arg(short, long, default_value_t = 1)]
    level: u32,

    /// Extra enemy health on top of the level number
    #[arg(long, default_value_t = 0)]
    health_bonus: u32,

    /// JSON generation config; command line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the level as JSON instead of ASCII
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Walk the level with the autopilot and report the result
    #[arg(long)]
    autopilot: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    level: &'a LevelContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    autopilot: Option<hard_division::AutopilotReport>,
}

fn main() -> DivisionResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;
    info!("Starting Hard Division v{}", hard_division::VERSION);

    let config = build_config(&args)?;
    let mut rng = config.create_rng();
    let mut level = LevelContext::generate(&config, args.level, args.health_bonus, &mut rng)?;
    let layout = level.clone();

    let report = args.autopilot.then(|| {
        let max_steps = Autopilot::step_budget(level.grid.width(), level.grid.height());
        Autopilot::new().drive(&mut level, max_steps)
    });

    if args.json {
        let output = Output {
            level: &layout,
            autopilot: report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Level {} | {} | seed {} | {}x{}",
        layout.level,
        layout.strategy.name(),
        config.seed,
        layout.grid.width(),
        layout.grid.height()
    );
    print!("{}", layout);
    println!(
        "Enemies: {} (health {}) | Pickups: {} (points {})",
        layout.enemies.len(),
        layout.total_enemy_health(),
        layout.pickups.len(),
        layout.total_pickup_value()
    );

    if let Some(report) = report {
        println!(
            "Autopilot: {} steps, {} plans, {} replans, key {}, stairs {}",
            report.steps,
            report.plans,
            report.replans,
            if report.key_collected { "collected" } else { "missed" },
            if report.reached_stairs { "reached" } else { "not reached" }
        );
    }

    Ok(())
}

/// Merges the config file (if any) with command line overrides.
fn build_config(args: &Args) -> DivisionResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };

    config.seed = args.seed.unwrap_or_else(rand::random);
    if let Some(width) = args.width {
        config.map_width = width;
    }
    if let Some(height) = args.height {
        config.map_height = height;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    if config.map_width == 0 || config.map_height == 0 {
        return Err(DivisionError::InvalidState(format!(
            "map size {}x{} has no cells",
            config.map_width, config.map_height
        )));
    }
    Ok(config)
}

/// Initializes env_logger; `RUST_LOG` still takes precedence.
fn initialize_logging(log_level: &str) -> DivisionResult<()> {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        other => {
            return Err(DivisionError::InvalidState(format!(
                "unknown log level '{}'",
                other
            )))
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();

    Ok(())
}
