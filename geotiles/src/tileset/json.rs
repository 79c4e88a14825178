//! Decoding of 3D Tiles tileset documents.
//!
//! The raw serde structures mirror the JSON layout; [`decode_tileset`]
//! converts them into the typed [`Tileset`] tree and is the only place the
//! content URI suffix is inspected.

use serde::Deserialize;
use thiserror::Error;

use super::types::{BoundingVolume, OrientedBox, Refine, Region, Sphere, TileContent, TileNode, Tileset};
use super::uri::is_tileset_document;

/// Errors raised while decoding a tileset document.
#[derive(Debug, Error)]
pub enum TilesetError {
    /// The document is not valid tileset JSON.
    #[error("invalid tileset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A bounding volume has the wrong number of values.
    #[error("bounding volume '{kind}' needs {expected} values, got {actual}")]
    BoundingVolume {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The refine value is neither ADD nor REPLACE.
    #[error("unknown refine mode '{0}'")]
    Refine(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTileset {
    #[serde(default)]
    asset: Option<RawAsset>,
    #[serde(default)]
    geometric_error: f64,
    root: RawTile,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTile {
    #[serde(default)]
    bounding_volume: Option<RawBoundingVolume>,
    #[serde(default)]
    geometric_error: f64,
    #[serde(default)]
    refine: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    children: Vec<RawTile>,
}

#[derive(Debug, Deserialize)]
struct RawBoundingVolume {
    #[serde(default)]
    region: Option<Vec<f64>>,
    #[serde(default, rename = "box")]
    oriented_box: Option<Vec<f64>>,
    #[serde(default)]
    sphere: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    uri: Option<String>,
    /// Pre-1.0 tilesets name the field `url`.
    #[serde(default)]
    url: Option<String>,
}

/// Decodes a tileset document fetched from `uri`.
pub fn decode_tileset(uri: &str, bytes: &[u8]) -> Result<Tileset, TilesetError> {
    let raw: RawTileset = serde_json::from_slice(bytes)?;

    Ok(Tileset {
        uri: uri.to_string(),
        version: raw.asset.and_then(|a| a.version),
        geometric_error: raw.geometric_error,
        root: convert_tile(raw.root)?,
    })
}

fn convert_tile(raw: RawTile) -> Result<TileNode, TilesetError> {
    let bounding_volume = raw.bounding_volume.map(convert_volume).transpose()?.flatten();
    let refine = raw.refine.as_deref().map(parse_refine).transpose()?;
    let content = raw
        .content
        .and_then(|c| c.uri.or(c.url))
        .filter(|uri| !uri.is_empty())
        .map(|uri| {
            if is_tileset_document(&uri) {
                TileContent::External { uri }
            } else {
                TileContent::Mesh { uri }
            }
        });
    let children = raw
        .children
        .into_iter()
        .map(convert_tile)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TileNode {
        bounding_volume,
        geometric_error: raw.geometric_error,
        refine,
        content,
        children,
    })
}

/// Region wins over box and sphere when several are present.
fn convert_volume(raw: RawBoundingVolume) -> Result<Option<BoundingVolume>, TilesetError> {
    if let Some(values) = raw.region {
        let values = fixed::<6>("region", values)?;
        return Ok(Some(BoundingVolume::Region(Region::from_array(values))));
    }
    if let Some(values) = raw.oriented_box {
        let values = fixed::<12>("box", values)?;
        return Ok(Some(BoundingVolume::Box(OrientedBox(values))));
    }
    if let Some(values) = raw.sphere {
        let [x, y, z, radius] = fixed::<4>("sphere", values)?;
        return Ok(Some(BoundingVolume::Sphere(Sphere {
            center: [x, y, z],
            radius,
        })));
    }
    Ok(None)
}

fn fixed<const N: usize>(kind: &'static str, values: Vec<f64>) -> Result<[f64; N], TilesetError> {
    let actual = values.len();
    values.try_into().map_err(|_| TilesetError::BoundingVolume {
        kind,
        expected: N,
        actual,
    })
}

fn parse_refine(value: &str) -> Result<Refine, TilesetError> {
    match value.to_ascii_uppercase().as_str() {
        "ADD" => Ok(Refine::Add),
        "REPLACE" => Ok(Refine::Replace),
        _ => Err(TilesetError::Refine(value.to_string())),
    }
}
