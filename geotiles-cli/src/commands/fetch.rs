//! Fetch command - download the tiles covering a boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geotiles::config::{format_size, parse_size};
use geotiles::download::CancelToken;
use geotiles::geodesy::{Geodetic, LocalTangentPlane, ModelPoint};
use geotiles::importer::GlbImporter;
use geotiles::orchestrator::{AreaFetcher, FetchRequest, OutcomeSource};
use geotiles::provider::{GoogleTilesService, ReqwestClient};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub boundary: PathBuf,
    /// Model origin as (latitude, longitude) in degrees.
    pub origin: Option<(f64, f64)>,
    pub origin_height: f64,
    pub units_per_meter: f64,
    pub lod: u32,
    pub budget: Option<String>,
    pub offline: bool,
    pub cache_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub parallel: Option<usize>,
    pub verbose: bool,
}

/// Parses boundary text: one `x y [z]` vertex per line.
///
/// Blank lines and `#` comments are ignored; commas count as separators.
pub fn parse_boundary(text: &str) -> Result<Vec<ModelPoint>, CliError> {
    let mut points = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let values: Vec<f64> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| CliError::Boundary(format!("line {}: {}", index + 1, e)))?;

        match values.as_slice() {
            [x, y] => points.push(ModelPoint::new(*x, *y, 0.0)),
            [x, y, z] => points.push(ModelPoint::new(*x, *y, *z)),
            _ => {
                return Err(CliError::Boundary(format!(
                    "line {}: expected 2 or 3 coordinates, found {}",
                    index + 1,
                    values.len()
                )))
            }
        }
    }

    Ok(points)
}

fn read_boundary(path: &Path) -> Result<Vec<ModelPoint>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Boundary(format!("{}: {}", path.display(), e)))?;
    parse_boundary(&text)
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("fetch");
    let config = runner.config();

    let boundary = read_boundary(&args.boundary)?;

    // CLI takes precedence, then config
    let api_key = args
        .api_key
        .or_else(|| config.provider.api_key.clone())
        .unwrap_or_default();
    let budget = match args.budget {
        Some(text) => parse_size(&text)?,
        None => config.cache.budget,
    };
    let cache_dir = args
        .cache_dir
        .unwrap_or_else(|| config.cache.directory.clone());
    let mut policy = config.download_policy();
    if let Some(parallel) = args.parallel {
        policy = policy.with_parallel(parallel);
    }

    let client = ReqwestClient::with_timeout(config.provider.timeout)?;
    let service =
        GoogleTilesService::new(client, api_key).with_root_url(config.provider.root_url.clone());
    let importer = GlbImporter::new();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, finishing in-flight downloads...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let mut request = FetchRequest::new(boundary, &cache_dir)
        .with_max_depth(args.lod)
        .with_budget(i64::try_from(budget).unwrap_or(i64::MAX))
        .with_network(!args.offline)
        .with_cancel(cancel);
    if let Some((lat, lon)) = args.origin {
        let origin = Geodetic::new(lon, lat, args.origin_height);
        request = request.with_anchor(Arc::new(LocalTangentPlane::with_units(
            origin,
            args.units_per_meter,
        )));
    }

    println!("GeoTiles v{}", geotiles::VERSION);
    println!("Cache:  {}", cache_dir.display());
    println!(
        "Budget: {}",
        if budget == 0 {
            "unbounded".to_string()
        } else {
            format_size(budget)
        }
    );
    println!();

    let outcome = AreaFetcher::new(&service, &importer)
        .with_policy(policy)
        .fetch(&request)?;

    for line in &outcome.diagnostics {
        println!("  {}", line);
    }
    println!();

    let source = match outcome.source {
        OutcomeSource::Manifest => "from cache",
        OutcomeSource::Download => "downloaded",
        OutcomeSource::NothingPlanned => "nothing to fetch",
    };
    println!("Files:       {} ({})", outcome.files.len(), source);
    println!(
        "Meshes:      {} ({} materials)",
        outcome.scene.meshes, outcome.scene.materials
    );
    if !outcome.attribution.is_empty() {
        println!("Attribution: {}", outcome.attribution);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let text = "# square\n0 0\n10, 0, 1.5\n10 10\n\n0 10  # last corner\n0 0\n";
        let points = parse_boundary(text).unwrap();

        assert_eq!(points.len(), 5);
        assert_eq!(points[1], ModelPoint::new(10.0, 0.0, 1.5));
        assert_eq!(points[4], ModelPoint::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_boundary_rejects_bad_lines() {
        assert!(parse_boundary("1 2 3 4\n").is_err());
        assert!(parse_boundary("1\n").is_err());
        let err = parse_boundary("0 0\nx y\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn test_read_boundary_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("area.txt");
        std::fs::write(&path, "0 0\n1 0\n1 1\n0 0\n").unwrap();

        assert_eq!(read_boundary(&path).unwrap().len(), 4);
        assert!(read_boundary(&temp.path().join("missing.txt")).is_err());
    }
}
