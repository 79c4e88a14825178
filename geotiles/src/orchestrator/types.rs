//! Request, outcome and diagnostics types

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::download::{CancelToken, DownloadReport};
use crate::geodesy::{EarthAnchor, ModelPoint};
use crate::importer::ImportedScene;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: u32 = 16;

/// Default host working precision in model units.
pub const DEFAULT_MODEL_PRECISION: f64 = 1e-5;

/// Inputs of one area fetch.
#[derive(Clone)]
pub struct FetchRequest {
    /// Closed boundary in model coordinates.
    pub boundary: Vec<ModelPoint>,
    /// Host model to earth transform, if the host has one.
    pub anchor: Option<Arc<dyn EarthAnchor>>,
    /// Host working precision, used for closure and footprint tolerances.
    pub model_precision: f64,
    pub max_depth: u32,
    pub cache_dir: PathBuf,
    /// When false only cached content is used.
    pub allow_network: bool,
    /// Byte cap; zero or less is unbounded.
    pub budget: i64,
    pub cancel: CancelToken,
}

impl FetchRequest {
    pub fn new(boundary: Vec<ModelPoint>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            boundary,
            anchor: None,
            model_precision: DEFAULT_MODEL_PRECISION,
            max_depth: DEFAULT_MAX_DEPTH,
            cache_dir: cache_dir.into(),
            allow_network: true,
            budget: 0,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: Arc<dyn EarthAnchor>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_network(mut self, allow_network: bool) -> Self {
        self.allow_network = allow_network;
        self
    }

    pub fn with_model_precision(mut self, precision: f64) -> Self {
        self.model_precision = precision;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("vertices", &self.boundary.len())
            .field("anchored", &self.anchor.is_some())
            .field("max_depth", &self.max_depth)
            .field("cache_dir", &self.cache_dir)
            .field("allow_network", &self.allow_network)
            .field("budget", &self.budget)
            .finish()
    }
}

/// Where the outcome's files came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    /// A validated manifest; nothing was planned or downloaded.
    Manifest,
    /// A fresh plan and download.
    Download,
    /// The plan was empty.
    NothingPlanned,
}

/// Result of one area fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Every skip, fallback and reuse decision, in order.
    pub diagnostics: Vec<String>,
    /// Local tile files used.
    pub files: Vec<PathBuf>,
    pub scene: ImportedScene,
    pub attribution: String,
    pub source: OutcomeSource,
    pub fingerprint: String,
    /// Present when a download ran.
    pub report: Option<DownloadReport>,
}

/// Ordered diagnostic lines, mirrored to the log.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<String>);

impl Diagnostics {
    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.0.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!("{}", line);
        self.0.push(format!("warning: {}", line));
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }
}
