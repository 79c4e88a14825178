//! Tileset model and planner
//!
//! Decodes remote 3D tileset documents into a typed tree and walks that
//! tree to decide which tile files an area of interest needs.

mod json;
mod types;
pub mod uri;
mod walker;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use json::{decode_tileset, TilesetError};
pub use types::{
    BoundingVolume, OrientedBox, PlannedTile, Refine, Region, Sphere, TileContent, TileNode,
    Tileset,
};
pub use walker::{TilesetPlan, TilesetWalker, WalkStats};
