//! Manifest cache
//!
//! One JSON manifest per area fingerprint records the files a completed
//! download produced, so a later identical request can skip planning and
//! downloading entirely.

mod store;
mod types;
mod validate;

pub use store::{is_manifest_file_name, is_manifest_temp_name, manifest_file_name, ManifestStore};
pub use types::{
    Manifest, ManifestEntry, ManifestError, CURRENT_SCHEMA_VERSION, GEODETIC_SCHEMA_VERSION,
};
pub use validate::{
    model_tolerance, validate, ManifestMismatch, ManifestRequest, GEODETIC_TOLERANCE_DEG,
    MODEL_TOLERANCE_FLOOR,
};
