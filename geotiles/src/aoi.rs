//! Area of interest.
//!
//! An [`AreaOfInterest`] is a closed planar boundary in model coordinates
//! together with the bounding boxes and the content fingerprint derived
//! from it. The fingerprint keys the manifest cache.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::geodesy::{
    boundary_to_geodetic_box, model_to_wgs84, EarthAnchor, GeodesyError, GeodeticBox, ModelBox,
    ModelPoint,
};

/// Decimal places kept when fingerprinting vertex coordinates.
///
/// Six decimals of a degree is roughly 0.1 m, so floating noise from
/// repeated coordinate transforms never changes the fingerprint.
pub const FINGERPRINT_DECIMALS: i32 = 6;

/// Minimum vertex count of a closed boundary (a triangle plus the closing vertex).
const MIN_CLOSED_VERTICES: usize = 4;

/// Errors raised while validating a boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AoiError {
    /// The boundary has too few vertices to enclose an area.
    #[error("boundary needs at least 4 vertices, got {0}")]
    TooFewVertices(usize),

    /// First and last vertices differ.
    #[error("boundary is not closed (gap of {gap} model units between first and last vertex)")]
    NotClosed { gap: f64 },

    /// A vertex has a NaN or infinite component.
    #[error("boundary vertex {0} is not finite")]
    NonFinite(usize),
}

/// A validated, closed area of interest.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    vertices: Vec<ModelPoint>,
    model_box: ModelBox,
    geodetic: Result<Geodetic2d, GeodesyError>,
}

/// Rounded geodetic vertex list and its bounding box.
#[derive(Debug, Clone)]
struct Geodetic2d {
    bbox: GeodeticBox,
    vertices: Vec<(f64, f64)>,
}

impl AreaOfInterest {
    /// Validates a boundary and derives its boxes.
    ///
    /// `closure_tolerance` is the largest gap, in model units, accepted
    /// between the first and last vertex. A missing earth anchor is not an
    /// error here; it is reported by [`geodetic_error`](Self::geodetic_error).
    pub fn new(
        boundary: Vec<ModelPoint>,
        anchor: Option<&dyn EarthAnchor>,
        closure_tolerance: f64,
    ) -> Result<Self, AoiError> {
        if boundary.len() < MIN_CLOSED_VERTICES {
            return Err(AoiError::TooFewVertices(boundary.len()));
        }
        if let Some(i) = boundary.iter().position(|p| !p.is_finite()) {
            return Err(AoiError::NonFinite(i));
        }

        let first = boundary[0];
        let last = boundary[boundary.len() - 1];
        let gap = (first.x - last.x).hypot(first.y - last.y);
        if gap > closure_tolerance {
            return Err(AoiError::NotClosed { gap });
        }

        let model_box = ModelBox::from_points(&boundary);
        let geodetic = geodetic_vertices(&boundary, anchor);

        Ok(Self {
            vertices: boundary,
            model_box,
            geodetic,
        })
    }

    /// Boundary vertices in model coordinates.
    pub fn vertices(&self) -> &[ModelPoint] {
        &self.vertices
    }

    /// Model-space bounding box.
    pub fn model_box(&self) -> &ModelBox {
        &self.model_box
    }

    /// Geodetic bounding box, when the host has an earth reference.
    pub fn geodetic_box(&self) -> Option<&GeodeticBox> {
        self.geodetic.as_ref().ok().map(|g| &g.bbox)
    }

    /// Why no geodetic box is available, if it is not.
    pub fn geodetic_error(&self) -> Option<&GeodesyError> {
        self.geodetic.as_ref().err()
    }

    /// Content fingerprint of the rounded vertex sequence and detail level.
    ///
    /// Lowercase hex SHA-256. Changes if and only if a rounded vertex or the
    /// detail level changes. Without an earth reference the model
    /// coordinates are rounded instead, under a distinct prefix.
    pub fn fingerprint(&self, max_depth: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("lod={};", max_depth));

        match &self.geodetic {
            Ok(geo) => {
                hasher.update(b"wgs84;");
                for (lon, lat) in &geo.vertices {
                    hasher.update(format!("{},{};", round_units(*lon), round_units(*lat)));
                }
            }
            Err(_) => {
                hasher.update(b"model;");
                for p in &self.vertices {
                    hasher.update(format!("{},{};", round_units(p.x), round_units(p.y)));
                }
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

fn geodetic_vertices(
    boundary: &[ModelPoint],
    anchor: Option<&dyn EarthAnchor>,
) -> Result<Geodetic2d, GeodesyError> {
    let bbox = boundary_to_geodetic_box(boundary, anchor)?;
    let vertices = boundary
        .iter()
        .map(|p| model_to_wgs84(anchor, *p).map(|g| (g.lon, g.lat)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Geodetic2d { bbox, vertices })
}

/// Rounds to [`FINGERPRINT_DECIMALS`] and returns the scaled integer, so
/// that -0.0000001 and 0.0000001 hash identically.
fn round_units(value: f64) -> i64 {
    (value * 10f64.powi(FINGERPRINT_DECIMALS)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{Geodetic, LocalTangentPlane};

    /// An anchor that maps model X/Y directly to longitude/latitude degrees.
    struct DegreesAnchor;

    impl EarthAnchor for DegreesAnchor {
        fn model_to_ecef(&self, point: ModelPoint) -> crate::geodesy::Ecef {
            crate::geodesy::wgs84_to_ecef(Geodetic::new(point.x, point.y, 0.0))
        }

        fn ecef_to_model(&self, ecef: crate::geodesy::Ecef) -> ModelPoint {
            let geo = crate::geodesy::ecef_to_wgs84(ecef);
            ModelPoint::new(geo.lon, geo.lat, 0.0)
        }
    }

    fn square(lon: f64, lat: f64, size: f64) -> Vec<ModelPoint> {
        vec![
            ModelPoint::new(lon, lat, 0.0),
            ModelPoint::new(lon + size, lat, 0.0),
            ModelPoint::new(lon + size, lat + size, 0.0),
            ModelPoint::new(lon, lat + size, 0.0),
            ModelPoint::new(lon, lat, 0.0),
        ]
    }

    #[test]
    fn test_rejects_too_few_vertices() {
        let err = AreaOfInterest::new(square(0.0, 0.0, 1.0)[..3].to_vec(), None, 1e-6).unwrap_err();
        assert_eq!(err, AoiError::TooFewVertices(3));
    }

    #[test]
    fn test_rejects_open_boundary() {
        let mut boundary = square(0.0, 0.0, 1.0);
        boundary.pop();
        boundary.push(ModelPoint::new(0.5, 0.5, 0.0));

        let err = AreaOfInterest::new(boundary, None, 1e-6).unwrap_err();
        assert!(matches!(err, AoiError::NotClosed { .. }));
    }

    #[test]
    fn test_rejects_non_finite_vertex() {
        let mut boundary = square(0.0, 0.0, 1.0);
        boundary[2].y = f64::NAN;

        assert_eq!(
            AreaOfInterest::new(boundary, None, 1e-6).unwrap_err(),
            AoiError::NonFinite(2)
        );
    }

    #[test]
    fn test_without_anchor_reports_geodetic_error() {
        let aoi = AreaOfInterest::new(square(0.0, 0.0, 10.0), None, 1e-6).unwrap();

        assert!(aoi.geodetic_box().is_none());
        assert_eq!(aoi.geodetic_error(), Some(&GeodesyError::NoEarthReference));
        assert!(aoi.model_box().is_valid());
    }

    #[test]
    fn test_geodetic_box_from_anchor() {
        let aoi = AreaOfInterest::new(square(7.25, 46.5, 0.01), Some(&DegreesAnchor), 1e-9).unwrap();
        let bbox = aoi.geodetic_box().unwrap();

        assert!((bbox.min_lon - 7.25).abs() < 1e-9);
        assert!((bbox.max_lat - 46.51).abs() < 1e-9);
    }

    #[test]
    fn test_fingerprint_ignores_sub_precision_noise() {
        let a = AreaOfInterest::new(square(7.25, 46.5, 0.01), Some(&DegreesAnchor), 1e-9).unwrap();
        let b = AreaOfInterest::new(
            square(7.25 + 1e-7, 46.5 - 1e-7, 0.01),
            Some(&DegreesAnchor),
            1e-9,
        )
        .unwrap();

        assert_eq!(a.fingerprint(3), b.fingerprint(3));
    }

    #[test]
    fn test_fingerprint_changes_beyond_precision() {
        let a = AreaOfInterest::new(square(7.25, 46.5, 0.01), Some(&DegreesAnchor), 1e-9).unwrap();
        let b = AreaOfInterest::new(square(7.25 + 1e-5, 46.5, 0.01), Some(&DegreesAnchor), 1e-9)
            .unwrap();

        assert_ne!(a.fingerprint(3), b.fingerprint(3));
    }

    #[test]
    fn test_fingerprint_changes_with_detail_level() {
        let aoi = AreaOfInterest::new(square(7.25, 46.5, 0.01), Some(&DegreesAnchor), 1e-9).unwrap();
        assert_ne!(aoi.fingerprint(3), aoi.fingerprint(4));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let plane = LocalTangentPlane::new(Geodetic::new(0.0, 0.0, 0.0));
        let aoi = AreaOfInterest::new(square(0.0, 0.0, 100.0), Some(&plane), 1e-9).unwrap();
        let fp = aoi.fingerprint(0);

        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_model_and_geodetic_fingerprints_differ() {
        let boundary = square(7.25, 46.5, 0.01);
        let with_anchor = AreaOfInterest::new(boundary.clone(), Some(&DegreesAnchor), 1e-9).unwrap();
        let without = AreaOfInterest::new(boundary, None, 1e-9).unwrap();

        assert_ne!(with_anchor.fingerprint(2), without.fingerprint(2));
    }

    #[test]
    fn test_round_units_signed_zero() {
        assert_eq!(round_units(-1e-8), round_units(1e-8));
    }
}
