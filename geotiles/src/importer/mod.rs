//! Mesh importer
//!
//! Turns downloaded tile files into the scene summary and attribution
//! handed back to the host.

mod glb;

use std::path::PathBuf;

use thiserror::Error;

pub use glb::{build_attribution, read_glb, GlbError, GlbImporter};

#[cfg(any(test, feature = "test-util"))]
pub use glb::glb_bytes;

/// Import failed for every file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("none of the {count} tile files could be imported; first failure at {path}: {reason}")]
    NothingImported {
        count: usize,
        path: PathBuf,
        reason: String,
    },
}

/// One imported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub path: PathBuf,
    pub meshes: usize,
    pub materials: usize,
    pub copyright: Option<String>,
}

/// A file that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of importing a set of tile files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedScene {
    pub files: Vec<ImportedFile>,
    pub failures: Vec<ImportFailure>,
    pub meshes: usize,
    pub materials: usize,
    /// Distinct copyright holders, most frequent first.
    pub attribution: String,
}

/// Host collaborator that turns tile files into geometry.
pub trait MeshImporter: Send + Sync {
    fn import(&self, files: &[PathBuf]) -> Result<ImportedScene, ImportError>;
}
