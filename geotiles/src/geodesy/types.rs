//! Point, box and error types shared by the geodetic conversions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while converting between coordinate frames.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeodesyError {
    /// The host has no model-to-earth transform configured.
    #[error("no earth reference is configured for the model")]
    NoEarthReference,

    /// The boundary contained no vertices.
    #[error("boundary has no vertices")]
    EmptyBoundary,

    /// A vertex produced a non-finite coordinate.
    #[error("non-finite coordinate at vertex {0}")]
    NonFinite(usize),
}

/// A point in the host's local model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ModelPoint {
    /// Creates a new model point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// An earth-centered, earth-fixed Cartesian position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    /// Creates a new ECEF position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A WGS84 geodetic position. Angles are in degrees, height in meters
/// above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

impl Geodetic {
    /// Creates a new geodetic position from degrees and meters.
    pub const fn new(lon: f64, lat: f64, height: f64) -> Self {
        Self { lon, lat, height }
    }
}

/// Axis-aligned longitude/latitude box in degrees.
///
/// A freshly created box is empty (min > max) and becomes valid once at
/// least one position has been folded into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeodeticBox {
    /// Creates a box from explicit corners.
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// An empty box that contains nothing.
    pub const fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    /// Whether the box contains at least one position.
    pub fn is_valid(&self) -> bool {
        self.min_lon <= self.max_lon && self.min_lat <= self.max_lat
    }

    /// Grows the box to include the given longitude/latitude.
    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Axis-aligned overlap test against another box in degrees.
    ///
    /// Touching edges count as overlap.
    pub fn overlaps(&self, other: &GeodeticBox) -> bool {
        !(other.max_lon < self.min_lon || other.min_lon > self.max_lon)
            && !(other.max_lat < self.min_lat || other.min_lat > self.max_lat)
    }

    /// Largest absolute corner difference to another box, in degrees.
    pub fn max_corner_delta(&self, other: &GeodeticBox) -> f64 {
        [
            (self.min_lon - other.min_lon).abs(),
            (self.min_lat - other.min_lat).abs(),
            (self.max_lon - other.max_lon).abs(),
            (self.max_lat - other.max_lat).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

impl Default for GeodeticBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Axis-aligned box in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelBox {
    pub min: ModelPoint,
    pub max: ModelPoint,
}

impl ModelBox {
    /// An empty box that contains nothing.
    pub const fn empty() -> Self {
        Self {
            min: ModelPoint::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: ModelPoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing all the given points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a ModelPoint>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.extend(p);
        }
        bbox
    }

    /// Grows the box to include the point.
    pub fn extend(&mut self, p: &ModelPoint) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Whether the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Whether the X and Y corners of both boxes agree within `tolerance`.
    ///
    /// Z is ignored: boundaries are planar and their elevation is not part
    /// of the area's identity.
    pub fn matches_xy(&self, other: &ModelBox, tolerance: f64) -> bool {
        (self.min.x - other.min.x).abs() <= tolerance
            && (self.min.y - other.min.y).abs() <= tolerance
            && (self.max.x - other.max.x).abs() <= tolerance
            && (self.max.y - other.max.y).abs() <= tolerance
    }
}

impl Default for ModelBox {
    fn default() -> Self {
        Self::empty()
    }
}
