//! Media helpers: type inference from remote URLs and local asset validation.

use crate::types::MediaType;
use std::path::Path;

/// Extensions played as video. Everything else is treated as a still image.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm"];

/// Extract the lowercase file extension of the last path segment of a URL.
///
/// Query strings and fragments are ignored. Works for absolute URLs and for
/// bare paths that `url` cannot parse.
pub fn url_extension(raw: &str) -> Option<String> {
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Infer the media type of a creative from its URL.
pub fn infer_media_type(url: &str) -> MediaType {
    match url_extension(url) {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaType::Video,
        _ => MediaType::Image,
    }
}

/// Local asset validity predicate.
///
/// A cached asset is only trusted when the path is set, the file exists, it is a
/// regular file and it is not empty.
pub fn is_valid(path: Option<&Path>) -> bool {
    let Some(path) = path else {
        return false;
    };

    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
