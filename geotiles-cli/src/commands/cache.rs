//! Cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use geotiles::cache::{cache_stats, cached_manifests, clear_cache};
use geotiles::config::{format_size, ConfigFile};

use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache statistics
    Stats {
        /// Cache directory; overrides config
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// List cached areas
    List {
        /// Cache directory; overrides config
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Remove all cached tiles and manifests
    Clear {
        /// Cache directory; overrides config
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn resolve_dir(cli_dir: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_dir {
        Some(dir) => Ok(dir),
        None => Ok(ConfigFile::load()?.cache.directory),
    }
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { cache_dir } => {
            let dir = resolve_dir(cache_dir)?;
            println!("Tile cache: {}", dir.display());

            let stats = cache_stats(&dir).map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("  Areas: {}", stats.manifests);
            println!("  Tiles: {}", stats.tile_files);
            println!("  Size:  {}", format_size(stats.bytes));
            Ok(())
        }
        CacheAction::List { cache_dir } => {
            let dir = resolve_dir(cache_dir)?;
            let manifests = cached_manifests(&dir);
            if manifests.is_empty() {
                println!("No cached areas in {}", dir.display());
                return Ok(());
            }

            for (name, manifest) in manifests {
                println!("{}", name);
                println!("  Detail level: {}", manifest.lod);
                println!(
                    "  Files:        {} ({})",
                    manifest.files.len(),
                    format_size(manifest.total_bytes())
                );
                if let Some(bbox) = manifest.geodetic_box {
                    println!(
                        "  Area:         {:.6},{:.6} .. {:.6},{:.6}",
                        bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
                    );
                }
                println!("  Generated:    {}", manifest.generated_at);
            }
            Ok(())
        }
        CacheAction::Clear { cache_dir } => {
            let dir = resolve_dir(cache_dir)?;
            println!("Clearing tile cache at: {}", dir.display());

            let result = clear_cache(&dir).map_err(|e| CliError::CacheClear(e.to_string()))?;
            println!(
                "Deleted {} files, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed)
            );
            Ok(())
        }
    }
}
