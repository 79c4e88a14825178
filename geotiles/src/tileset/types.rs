//! Tileset tree model.

use std::f64::consts::PI;

use crate::geodesy::GeodeticBox;

/// Whether a node's own content is drawn alongside its children or
/// superseded by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Refine {
    /// Coarse and fine content are rendered together.
    Add,
    /// Only the most detailed selected level is kept.
    #[default]
    Replace,
}

/// A geodetic region: radians for the angles, meters for the heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Region {
    /// Creates a region from the six values of the tileset encoding.
    pub fn from_array(values: [f64; 6]) -> Self {
        let [west, south, east, north, min_height, max_height] = values;
        Self {
            west,
            south,
            east,
            north,
            min_height,
            max_height,
        }
    }

    /// Creates a region from degrees, mostly for tests and fixtures.
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        let rad = PI / 180.0;
        Self::from_array([west * rad, south * rad, east * rad, north * rad, 0.0, 0.0])
    }

    /// The region's footprint in degrees.
    ///
    /// A region crossing the antimeridian has `west > east`.
    pub fn to_degrees(&self) -> GeodeticBox {
        GeodeticBox::new(
            self.west.to_degrees(),
            self.south.to_degrees(),
            self.east.to_degrees(),
            self.north.to_degrees(),
        )
    }

    /// Axis-aligned overlap test against an area's geodetic box.
    pub fn intersects(&self, aoi: &GeodeticBox) -> bool {
        let deg = self.to_degrees();
        if deg.min_lon <= deg.max_lon {
            return deg.overlaps(aoi);
        }
        // Split at the antimeridian
        GeodeticBox::new(deg.min_lon, deg.min_lat, 180.0, deg.max_lat).overlaps(aoi)
            || GeodeticBox::new(-180.0, deg.min_lat, deg.max_lon, deg.max_lat).overlaps(aoi)
    }
}

/// An oriented box in ECEF: center followed by three half-axis vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox(pub [f64; 12]);

/// A sphere in ECEF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: [f64; 3],
    pub radius: f64,
}

/// A node's spatial envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    Region(Region),
    Box(OrientedBox),
    Sphere(Sphere),
}

impl BoundingVolume {
    /// Whether the volume may overlap the area.
    ///
    /// Only regions can be tested in geodetic terms; boxes and spheres
    /// always intersect so they never prune.
    pub fn intersects(&self, aoi: &GeodeticBox) -> bool {
        match self {
            BoundingVolume::Region(region) => region.intersects(aoi),
            BoundingVolume::Box(_) | BoundingVolume::Sphere(_) => true,
        }
    }
}

/// What a node's content reference points to.
///
/// The tag is resolved once while decoding, from the URI suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileContent {
    /// A binary mesh tile.
    Mesh { uri: String },
    /// A nested tileset document to be spliced into the tree.
    External { uri: String },
}

impl TileContent {
    /// The referenced URI, relative to the containing document.
    pub fn uri(&self) -> &str {
        match self {
            TileContent::Mesh { uri } | TileContent::External { uri } => uri,
        }
    }
}

/// A node of a decoded tileset tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileNode {
    pub bounding_volume: Option<BoundingVolume>,
    pub geometric_error: f64,
    /// Explicit refine mode; `None` inherits from the parent.
    pub refine: Option<Refine>,
    pub content: Option<TileContent>,
    pub children: Vec<TileNode>,
}

/// A decoded tileset document.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    /// Location of the document; content URIs resolve against it.
    pub uri: String,
    pub version: Option<String>,
    pub geometric_error: f64,
    pub root: TileNode,
}

/// A tile the planner selected for download.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTile {
    /// Content URI resolved against the document that referenced it.
    pub uri: String,
    /// Tree depth at which the tile was selected; the root is 0.
    pub depth: u32,
    pub bounding_volume: BoundingVolume,
    /// Effective refine mode after inheritance.
    pub refine: Refine,
}
