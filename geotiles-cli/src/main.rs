//! GeoTiles CLI - Command-line interface
//!
//! Fetches the 3D tiles covering an area into a local cache and manages
//! that cache and the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;

#[derive(Debug, Parser)]
#[command(name = "geotiles", version, about = "Fetch and cache 3D tiles for an area of interest")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the tiles covering a boundary
    Fetch {
        /// Boundary file: one "x y [z]" model vertex per line, '#' comments
        #[arg(short, long)]
        boundary: PathBuf,

        /// Latitude of the model origin in degrees
        #[arg(long, requires = "origin_lon", allow_negative_numbers = true)]
        origin_lat: Option<f64>,

        /// Longitude of the model origin in degrees
        #[arg(long, requires = "origin_lat", allow_negative_numbers = true)]
        origin_lon: Option<f64>,

        /// Ellipsoidal height of the model origin in meters
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        origin_height: f64,

        /// Model units per meter (1000 for millimeters)
        #[arg(long, default_value_t = 1.0)]
        units_per_meter: f64,

        /// Maximum tree depth
        #[arg(short, long, default_value_t = geotiles::orchestrator::DEFAULT_MAX_DEPTH)]
        lod: u32,

        /// Byte budget, e.g. 500MB (0 = unbounded); overrides config
        #[arg(long)]
        budget: Option<String>,

        /// Use only cached content
        #[arg(long)]
        offline: bool,

        /// Cache directory; overrides config
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// API key; overrides config
        #[arg(long)]
        api_key: Option<String>,

        /// Concurrent downloads; overrides config
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// Inspect or clear the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            boundary,
            origin_lat,
            origin_lon,
            origin_height,
            units_per_meter,
            lod,
            budget,
            offline,
            cache_dir,
            api_key,
            parallel,
        } => commands::fetch::run(FetchArgs {
            boundary,
            origin: origin_lat.zip(origin_lon),
            origin_height,
            units_per_meter,
            lod,
            budget,
            offline,
            cache_dir,
            api_key,
            parallel,
            verbose: cli.verbose,
        }),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.exit(),
    }
}
