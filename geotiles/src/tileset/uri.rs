//! URI helpers for tileset documents and their content.

use reqwest::Url;

/// File suffix identifying a nested tileset document.
pub const TILESET_DOCUMENT_SUFFIX: &str = ".json";

/// Strips the query string and fragment from a URI.
pub fn strip_query(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    &uri[..end]
}

/// Whether a content URI references a nested tileset document.
pub fn is_tileset_document(uri: &str) -> bool {
    strip_query(uri)
        .to_ascii_lowercase()
        .ends_with(TILESET_DOCUMENT_SUFFIX)
}

/// Lowercase file extension of a URI's path, without the dot.
pub fn extension(uri: &str) -> Option<String> {
    let path = strip_query(uri);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Resolves `reference` against the URI of the document containing it.
///
/// Absolute URLs are returned unchanged. Relative references follow URL
/// joining rules when the base is a URL and plain path joining otherwise.
pub fn resolve(base: &str, reference: &str) -> String {
    if Url::parse(reference).is_ok() {
        return reference.to_string();
    }

    if let Ok(base_url) = Url::parse(base) {
        return base_url
            .join(reference)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| reference.to_string());
    }

    if reference.starts_with('/') {
        return reference.to_string();
    }

    let base_path = strip_query(base);
    match base_path.rfind('/') {
        Some(idx) => format!("{}{}", &base_path[..=idx], reference),
        None => reference.to_string(),
    }
}
