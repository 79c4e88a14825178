//! Model-to-earth transforms supplied by the host.

use super::types::{Ecef, Geodetic, ModelPoint};
use super::wgs84_to_ecef;

/// Transform between the host's model coordinates and the earth frame.
///
/// The host owns its coordinate system; the core only needs to move points
/// in and out of ECEF.
pub trait EarthAnchor: Send + Sync {
    /// Converts a model point to earth-centered coordinates.
    fn model_to_ecef(&self, point: ModelPoint) -> Ecef;

    /// Converts an earth-centered position back to model coordinates.
    fn ecef_to_model(&self, ecef: Ecef) -> ModelPoint;
}

/// A local east-north-up tangent plane anchored at a geodetic origin.
///
/// Model X points east, Y north and Z up. `units_per_meter` scales model
/// units (e.g. 1000.0 for millimeters).
#[derive(Debug, Clone)]
pub struct LocalTangentPlane {
    origin: Geodetic,
    origin_ecef: Ecef,
    units_per_meter: f64,
    // Rows are the east, north and up unit vectors in ECEF.
    axes: [[f64; 3]; 3],
}

impl LocalTangentPlane {
    /// Creates a tangent plane at the given origin with meters as model units.
    pub fn new(origin: Geodetic) -> Self {
        Self::with_units(origin, 1.0)
    }

    /// Creates a tangent plane with a custom model unit scale.
    pub fn with_units(origin: Geodetic, units_per_meter: f64) -> Self {
        let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();

        let axes = [
            [-sin_lon, cos_lon, 0.0],
            [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
            [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
        ];

        Self {
            origin,
            origin_ecef: wgs84_to_ecef(origin),
            units_per_meter: if units_per_meter > 0.0 { units_per_meter } else { 1.0 },
            axes,
        }
    }

    /// The geodetic origin of the plane.
    pub fn origin(&self) -> Geodetic {
        self.origin
    }
}

impl EarthAnchor for LocalTangentPlane {
    fn model_to_ecef(&self, point: ModelPoint) -> Ecef {
        let e = point.x / self.units_per_meter;
        let n = point.y / self.units_per_meter;
        let u = point.z / self.units_per_meter;
        let [east, north, up] = self.axes;

        Ecef::new(
            self.origin_ecef.x + east[0] * e + north[0] * n + up[0] * u,
            self.origin_ecef.y + east[1] * e + north[1] * n + up[1] * u,
            self.origin_ecef.z + east[2] * e + north[2] * n + up[2] * u,
        )
    }

    fn ecef_to_model(&self, ecef: Ecef) -> ModelPoint {
        let d = [
            ecef.x - self.origin_ecef.x,
            ecef.y - self.origin_ecef.y,
            ecef.z - self.origin_ecef.z,
        ];
        let dot = |axis: [f64; 3]| axis[0] * d[0] + axis[1] * d[1] + axis[2] * d[2];
        let [east, north, up] = self.axes;

        ModelPoint::new(
            dot(east) * self.units_per_meter,
            dot(north) * self.units_per_meter,
            dot(up) * self.units_per_meter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::ecef_to_wgs84;

    #[test]
    fn test_origin_maps_to_origin() {
        let plane = LocalTangentPlane::new(Geodetic::new(-74.0060, 40.7128, 10.0));
        let geo = ecef_to_wgs84(plane.model_to_ecef(ModelPoint::default()));

        assert!((geo.lon - -74.0060).abs() < 1e-9);
        assert!((geo.lat - 40.7128).abs() < 1e-9);
        assert!((geo.height - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_east_and_north_axes() {
        let plane = LocalTangentPlane::new(Geodetic::new(8.0, 47.0, 0.0));

        let east = ecef_to_wgs84(plane.model_to_ecef(ModelPoint::new(1000.0, 0.0, 0.0)));
        assert!(east.lon > 8.0);
        assert!((east.lat - 47.0).abs() < 1e-3);

        let north = ecef_to_wgs84(plane.model_to_ecef(ModelPoint::new(0.0, 1000.0, 0.0)));
        assert!(north.lat > 47.0);
        assert!((north.lon - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_model_roundtrip() {
        let plane = LocalTangentPlane::with_units(Geodetic::new(151.2093, -33.8688, 5.0), 1000.0);
        let point = ModelPoint::new(12_345.0, -6_789.0, 250.0);

        let back = plane.ecef_to_model(plane.model_to_ecef(point));

        assert!((back.x - point.x).abs() < 1e-3);
        assert!((back.y - point.y).abs() < 1e-3);
        assert!((back.z - point.z).abs() < 1e-3);
    }
}
