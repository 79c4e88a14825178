//! Versioned manifest validation.
//!
//! Version 2 manifests are checked strictly against the detail level,
//! geodetic box and vertex fingerprint. Every version is checked against
//! the model-space footprint, which is all a version 1 manifest records.

use thiserror::Error;

use super::types::Manifest;
use crate::geodesy::{GeodeticBox, ModelBox};

/// Geodetic corner tolerance in degrees, roughly one meter.
pub const GEODETIC_TOLERANCE_DEG: f64 = 1e-5;

/// Lower bound of the model-space corner tolerance.
pub const MODEL_TOLERANCE_FLOOR: f64 = 1e-3;

/// Model-space tolerance for a host working precision.
pub fn model_tolerance(precision: f64) -> f64 {
    let doubled = 2.0 * precision.abs();
    if doubled.is_finite() {
        doubled.max(MODEL_TOLERANCE_FLOOR)
    } else {
        MODEL_TOLERANCE_FLOOR
    }
}

/// The current request as seen by validation.
#[derive(Debug, Clone)]
pub struct ManifestRequest<'a> {
    pub model_box: &'a ModelBox,
    pub geodetic_box: Option<&'a GeodeticBox>,
    pub aoi_hash: &'a str,
    pub lod: u32,
    pub model_tolerance: f64,
}

/// Why a stored manifest does not describe the current request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ManifestMismatch {
    #[error("detail level changed ({stored} cached, {requested} requested)")]
    DetailLevel { stored: u32, requested: u32 },

    #[error("geodetic box moved by {delta:.2e} degrees")]
    GeodeticBox { delta: f64 },

    #[error("geodetic box available on only one side")]
    GeodeticAvailability,

    #[error("area fingerprint changed")]
    Fingerprint,

    #[error("model-space footprint changed beyond {tolerance}")]
    ModelBox { tolerance: f64 },
}

/// Checks whether `manifest` was written for `request`.
pub fn validate(manifest: &Manifest, request: &ManifestRequest<'_>) -> Result<(), ManifestMismatch> {
    if manifest.is_geodetic() {
        validate_geodetic(manifest, request)?;
    }

    if !manifest
        .model_box
        .matches_xy(request.model_box, request.model_tolerance)
    {
        return Err(ManifestMismatch::ModelBox {
            tolerance: request.model_tolerance,
        });
    }

    Ok(())
}

fn validate_geodetic(manifest: &Manifest, request: &ManifestRequest<'_>) -> Result<(), ManifestMismatch> {
    if manifest.lod != request.lod {
        return Err(ManifestMismatch::DetailLevel {
            stored: manifest.lod,
            requested: request.lod,
        });
    }

    match (&manifest.geodetic_box, request.geodetic_box) {
        (Some(stored), Some(current)) => {
            let delta = stored.max_corner_delta(current);
            if delta.is_nan() || delta > GEODETIC_TOLERANCE_DEG {
                return Err(ManifestMismatch::GeodeticBox { delta });
            }
        }
        (None, None) => {}
        _ => return Err(ManifestMismatch::GeodeticAvailability),
    }

    let hash_matches = manifest
        .aoi_hash
        .as_deref()
        .is_some_and(|stored| stored.eq_ignore_ascii_case(request.aoi_hash));
    if !hash_matches {
        return Err(ManifestMismatch::Fingerprint);
    }

    Ok(())
}
