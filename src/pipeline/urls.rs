//! Public URL construction and parsing
//!
//! Stored assets are served at `{base_url}/{category}/{file_name}`, where
//! `base_url` is the configured origin plus path prefix.

use super::request::AssetCategory;
use crate::validation::check_stored_name;

pub fn public_url(base_url: &str, category: AssetCategory, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        category.as_str(),
        file_name
    )
}

/// Path component of `url`: scheme and authority dropped, query and
/// fragment stripped. Inputs without a scheme are treated as bare paths.
pub fn url_path(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => without_query,
    }
}

/// Last path segment of `url`.
///
/// Returns `None` when the segment is empty or could not be stored safely
/// (hidden names, traversal, separators).
pub fn filename_from_url(url: &str) -> Option<String> {
    let name = url_path(url).rsplit('/').next().unwrap_or_default();
    check_stored_name(name).ok()?;
    Some(name.to_string())
}
