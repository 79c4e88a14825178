//! Geodetic conversions
//!
//! Converts between the host's model coordinates, WGS84 longitude/latitude
//! and earth-centered Cartesian (ECEF) coordinates, and folds an area
//! boundary into a geodetic bounding box for tileset pruning.

mod anchor;
mod types;

pub use anchor::{EarthAnchor, LocalTangentPlane};
pub use types::{Ecef, GeodesyError, Geodetic, GeodeticBox, ModelBox, ModelPoint};

/// WGS84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// WGS84 semi-minor axis in meters.
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// Fixed latitude iterations in [`ecef_to_wgs84`]; converges well below a
/// millimeter at earth scale.
const LATITUDE_ITERATIONS: usize = 5;

/// Converts a geodetic position to ECEF.
#[inline]
pub fn wgs84_to_ecef(geo: Geodetic) -> Ecef {
    let (sin_lat, cos_lat) = geo.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = geo.lon.to_radians().sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Ecef::new(
        (n + geo.height) * cos_lat * cos_lon,
        (n + geo.height) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + geo.height) * sin_lat,
    )
}

/// Converts an ECEF position to geodetic longitude/latitude/height.
///
/// Uses a fixed number of latitude refinements starting from the
/// spherical-ish estimate.
pub fn ecef_to_wgs84(ecef: Ecef) -> Geodetic {
    let lon = ecef.y.atan2(ecef.x);
    let p = ecef.x.hypot(ecef.y);

    // On the polar axis longitude is undefined and the iteration divides by cos(lat)
    if p < 1e-9 {
        let lat = if ecef.z >= 0.0 { 90.0 } else { -90.0 };
        return Geodetic::new(lon.to_degrees(), lat, ecef.z.abs() - WGS84_B);
    }

    let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;

    for _ in 0..LATITUDE_ITERATIONS {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = p / lat.cos() - n;
        lat = ecef.z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
    }

    Geodetic::new(lon.to_degrees(), lat.to_degrees(), height)
}

/// Converts a model point to ECEF through the host's earth anchor.
///
/// Fails with [`GeodesyError::NoEarthReference`] when the host has no anchor.
pub fn model_to_ecef(
    anchor: Option<&dyn EarthAnchor>,
    point: ModelPoint,
) -> Result<Ecef, GeodesyError> {
    anchor
        .map(|a| a.model_to_ecef(point))
        .ok_or(GeodesyError::NoEarthReference)
}

/// Converts a model point directly to WGS84.
pub fn model_to_wgs84(
    anchor: Option<&dyn EarthAnchor>,
    point: ModelPoint,
) -> Result<Geodetic, GeodesyError> {
    model_to_ecef(anchor, point).map(ecef_to_wgs84)
}

/// Folds every boundary vertex into a longitude/latitude box.
///
/// Callers treat an error as non-fatal: without an earth reference the
/// request continues with model-space validation only.
pub fn boundary_to_geodetic_box(
    boundary: &[ModelPoint],
    anchor: Option<&dyn EarthAnchor>,
) -> Result<GeodeticBox, GeodesyError> {
    let anchor = anchor.ok_or(GeodesyError::NoEarthReference)?;
    if boundary.is_empty() {
        return Err(GeodesyError::EmptyBoundary);
    }

    let mut bbox = GeodeticBox::empty();
    for (i, vertex) in boundary.iter().enumerate() {
        let geo = ecef_to_wgs84(anchor.model_to_ecef(*vertex));
        if !geo.lon.is_finite() || !geo.lat.is_finite() {
            return Err(GeodesyError::NonFinite(i));
        }
        bbox.extend(geo.lon, geo.lat);
    }

    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} != {} (tolerance {})", a, b, tol);
    }

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = wgs84_to_ecef(Geodetic::new(0.0, 0.0, 0.0));
        assert_close(ecef.x, WGS84_A, 1e-6);
        assert_close(ecef.y, 0.0, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let geo = ecef_to_wgs84(Ecef::new(0.0, 0.0, WGS84_B + 100.0));
        assert_close(geo.lat, 90.0, 1e-12);
        assert_close(geo.height, 100.0, 1e-6);
    }

    #[test]
    fn test_known_city_roundtrip() {
        // Zurich, roughly 400 m above the ellipsoid
        let original = Geodetic::new(8.5417, 47.3769, 408.0);
        let back = ecef_to_wgs84(wgs84_to_ecef(original));

        assert_close(back.lon, original.lon, 1e-9);
        assert_close(back.lat, original.lat, 1e-9);
        assert_close(back.height, original.height, 1e-3);
    }

    #[test]
    fn test_model_to_ecef_without_anchor() {
        let result = model_to_ecef(None, ModelPoint::default());
        assert_eq!(result, Err(GeodesyError::NoEarthReference));
    }

    #[test]
    fn test_boundary_box_requires_anchor() {
        let boundary = [ModelPoint::new(0.0, 0.0, 0.0)];
        assert_eq!(
            boundary_to_geodetic_box(&boundary, None),
            Err(GeodesyError::NoEarthReference)
        );
    }

    #[test]
    fn test_boundary_box_empty() {
        let plane = LocalTangentPlane::new(Geodetic::new(0.0, 0.0, 0.0));
        assert_eq!(
            boundary_to_geodetic_box(&[], Some(&plane)),
            Err(GeodesyError::EmptyBoundary)
        );
    }

    #[test]
    fn test_boundary_box_square() {
        let plane = LocalTangentPlane::new(Geodetic::new(10.0, 45.0, 0.0));
        let boundary = [
            ModelPoint::new(-500.0, -500.0, 0.0),
            ModelPoint::new(500.0, -500.0, 0.0),
            ModelPoint::new(500.0, 500.0, 0.0),
            ModelPoint::new(-500.0, 500.0, 0.0),
            ModelPoint::new(-500.0, -500.0, 0.0),
        ];

        let bbox = boundary_to_geodetic_box(&boundary, Some(&plane)).unwrap();

        assert!(bbox.is_valid());
        assert!(bbox.min_lon < 10.0 && bbox.max_lon > 10.0);
        assert!(bbox.min_lat < 45.0 && bbox.max_lat > 45.0);
        // A kilometer is roughly 0.009 degrees of latitude
        assert_close(bbox.max_lat - bbox.min_lat, 0.009, 0.001);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_wgs84_roundtrip_property(
                lon in -179.9..179.9_f64,
                lat in -89.9..89.9_f64,
                height in -500.0..9000.0_f64
            ) {
                let back = ecef_to_wgs84(wgs84_to_ecef(Geodetic::new(lon, lat, height)));

                prop_assert!((back.lon - lon).abs() < 1e-8, "lon {} -> {}", lon, back.lon);
                prop_assert!((back.lat - lat).abs() < 1e-8, "lat {} -> {}", lat, back.lat);
                prop_assert!((back.height - height).abs() < 1e-3, "height {} -> {}", height, back.height);
            }
        }
    }
}
