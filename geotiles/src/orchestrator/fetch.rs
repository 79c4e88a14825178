//! Area fetch operation

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use super::error::FetchError;
use super::types::{Diagnostics, FetchOutcome, FetchRequest, OutcomeSource};
use crate::aoi::AreaOfInterest;
use crate::download::{DownloadBudget, DownloadPolicy, FetchContext, TileDownloader};
use crate::importer::{ImportedScene, MeshImporter};
use crate::manifest::{self, Manifest, ManifestEntry, ManifestRequest, ManifestStore};
use crate::provider::TilesetService;
use crate::tileset::TilesetWalker;

/// Fetches the tiles covering an area, reusing a cached result when the
/// area's manifest still matches.
pub struct AreaFetcher<'a> {
    service: &'a dyn TilesetService,
    importer: &'a dyn MeshImporter,
    policy: DownloadPolicy,
}

impl<'a> AreaFetcher<'a> {
    pub fn new(service: &'a dyn TilesetService, importer: &'a dyn MeshImporter) -> Self {
        Self {
            service,
            importer,
            policy: DownloadPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DownloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one fetch.
    ///
    /// Input problems abort before any disk or network I/O. Cache problems
    /// fall through to a fresh download and are reported as diagnostics.
    pub fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let mut diag = Diagnostics::default();
        let tolerance = manifest::model_tolerance(request.model_precision);

        let aoi = AreaOfInterest::new(
            request.boundary.clone(),
            request.anchor.as_deref(),
            tolerance,
        )?;
        if request.allow_network {
            self.service.check_ready()?;
        }

        if let Some(e) = aoi.geodetic_error() {
            diag.warn(format!(
                "{}; geodetic validation and spatial pruning disabled",
                e
            ));
        }
        let fingerprint = aoi.fingerprint(request.max_depth);
        let store = ManifestStore::new(&request.cache_dir);

        if let Some(manifest) = self.cached_manifest(&store, &aoi, &fingerprint, request, &mut diag) {
            if let Some((files, scene, attribution)) = self.reuse(&store, &manifest, &mut diag) {
                return Ok(FetchOutcome {
                    diagnostics: diag.into_lines(),
                    files,
                    scene,
                    attribution,
                    source: OutcomeSource::Manifest,
                    fingerprint,
                    report: None,
                });
            }
        }

        if !request.allow_network {
            return Err(FetchError::OfflineCacheMiss { fingerprint });
        }

        let root = self
            .service
            .fetch_root_tileset()
            .map_err(FetchError::RootTileset)?;

        let mut walker = TilesetWalker::new(self.service, request.max_depth);
        if let Some(area) = aoi.geodetic_box() {
            walker = walker.with_area(*area);
        }
        let plan = walker.plan(&root);
        diag.info(format!(
            "planned {} tiles (visited {} nodes, pruned {}, {} nested tilesets)",
            plan.tiles.len(),
            plan.stats.visited,
            plan.stats.pruned,
            plan.stats.sub_tilesets_fetched
        ));
        if plan.stats.sub_tileset_failures > 0 {
            diag.warn(format!(
                "{} nested tilesets could not be fetched; their branches were skipped",
                plan.stats.sub_tileset_failures
            ));
        }

        if plan.is_empty() {
            diag.info("no tiles planned: the tileset has no content within the area");
            return Ok(FetchOutcome {
                diagnostics: diag.into_lines(),
                files: Vec::new(),
                scene: ImportedScene::default(),
                attribution: String::new(),
                source: OutcomeSource::NothingPlanned,
                fingerprint,
                report: None,
            });
        }

        let ctx = FetchContext {
            service: self.service,
            cache_dir: &request.cache_dir,
            allow_network: request.allow_network,
            cancel: &request.cancel,
        };
        let report = TileDownloader::new(self.policy.clone()).download(
            &plan.tiles,
            DownloadBudget::from_cap(request.budget),
            &ctx,
        )?;

        diag.info(format!("downloaded {}", report.summary()));
        if report.skipped_for_cap > 0 {
            diag.warn(format!(
                "{} tiles skipped to stay within the {} byte budget; coverage is partial",
                report.skipped_for_cap, request.budget
            ));
        }
        if let Some(failure) = &report.first_failure {
            diag.warn(format!(
                "{} tiles failed to download; first failure at {}: {}",
                report.failed, failure.uri, failure.reason
            ));
        }
        let cancelled = request.cancel.is_cancelled();
        if cancelled {
            diag.warn(format!(
                "cancelled; {} planned tiles were not attempted",
                report.not_attempted
            ));
        }

        let files = report.paths();
        let scene = self.import(&files, &mut diag)?;
        let attribution = scene.attribution.clone();

        if cancelled {
            diag.warn("manifest not written for a cancelled download");
        } else {
            let entries = report
                .files
                .iter()
                .filter_map(|f| {
                    Some(ManifestEntry {
                        name: f.path.file_name()?.to_string_lossy().into_owned(),
                        size: f.bytes,
                    })
                })
                .collect();
            let manifest = Manifest::new(
                request.max_depth,
                *aoi.model_box(),
                aoi.geodetic_box().copied(),
                fingerprint.clone(),
                attribution.clone(),
                entries,
            );
            match store.save(&fingerprint, &manifest) {
                Ok(path) => diag.info(format!("wrote manifest {}", path.display())),
                Err(e) => diag.warn(format!("failed to write manifest: {}", e)),
            }
        }

        Ok(FetchOutcome {
            diagnostics: diag.into_lines(),
            files,
            scene,
            attribution,
            source: OutcomeSource::Download,
            fingerprint,
            report: Some(report),
        })
    }

    /// Loads and validates the area's manifest. Any problem is a miss.
    fn cached_manifest(
        &self,
        store: &ManifestStore,
        aoi: &AreaOfInterest,
        fingerprint: &str,
        request: &FetchRequest,
        diag: &mut Diagnostics,
    ) -> Option<Manifest> {
        let manifest = match store.load(fingerprint) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                diag.info("no cached manifest for this area");
                return None;
            }
            Err(e) => {
                diag.warn(format!("{}; treating as a cache miss", e));
                return None;
            }
        };

        let check = ManifestRequest {
            model_box: aoi.model_box(),
            geodetic_box: aoi.geodetic_box(),
            aoi_hash: fingerprint,
            lod: request.max_depth,
            model_tolerance: manifest::model_tolerance(request.model_precision),
        };
        if let Err(mismatch) = manifest::validate(&manifest, &check) {
            diag.info(format!("cached manifest is stale: {}", mismatch));
            return None;
        }

        let missing = store.missing_files(&manifest);
        if !missing.is_empty() {
            diag.warn(format!(
                "cached manifest matches but {} of its {} files are missing (first: {}); downloading again",
                missing.len(),
                manifest.files.len(),
                missing[0]
            ));
            return None;
        }

        Some(manifest)
    }

    /// Imports the files of a valid manifest.
    ///
    /// When none of them can be read the files are deleted so the tile
    /// cache cannot serve them again, and the fetch falls through to a
    /// fresh download.
    fn reuse(
        &self,
        store: &ManifestStore,
        manifest: &Manifest,
        diag: &mut Diagnostics,
    ) -> Option<(Vec<PathBuf>, ImportedScene, String)> {
        let files = store.file_paths(manifest);
        let scene = match self.importer.import(&files) {
            Ok(scene) => scene,
            Err(e) => {
                diag.warn(format!(
                    "cached manifest matches but {}; discarding its tiles and downloading again",
                    e
                ));
                for path in &files {
                    if let Err(e) = fs::remove_file(path) {
                        debug!(path = %path.display(), error = %e, "Could not remove unreadable tile");
                    }
                }
                return None;
            }
        };
        Self::note_import(&scene, diag);

        diag.info(format!(
            "reusing {} cached tiles ({} bytes) from manifest generated {}",
            manifest.files.len(),
            manifest.total_bytes(),
            manifest.generated_at
        ));
        let attribution = if scene.attribution.is_empty() {
            manifest.attribution.clone()
        } else {
            scene.attribution.clone()
        };
        Some((files, scene, attribution))
    }

    fn import(&self, files: &[PathBuf], diag: &mut Diagnostics) -> Result<ImportedScene, FetchError> {
        let scene = self.importer.import(files)?;
        Self::note_import(&scene, diag);
        Ok(scene)
    }

    fn note_import(scene: &ImportedScene, diag: &mut Diagnostics) {
        for failure in &scene.failures {
            diag.warn(format!(
                "could not import {}: {}",
                failure.path.display(),
                failure.reason
            ));
        }
        info!(
            files = scene.files.len(),
            meshes = scene.meshes,
            materials = scene.materials,
            "Imported scene"
        );
    }
}
