//! # Utility Functions
//!
//! This module provides utility functions used throughout the mission service:
//! object key generation for uploaded media, path sanitization, and CORS
//! header construction.
//!
//! ## Object Key Strategy
//!
//! Uploaded media lands under `{folder}/{timestamp}-{filename}`. The
//! millisecond timestamp prefix gives best-effort uniqueness; the blob store
//! additionally refuses to overwrite an existing key (see `handlers::upload`).

use crate::constants::{
    CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN, DEFAULT_UPLOAD_FOLDER,
};
use worker::Headers;

/// Builds the storage key for an uploaded file.
///
/// The folder may contain `/` separators (the client uses per-mission folders
/// like `missions/{id}`); each segment is sanitized independently. The file
/// name keeps its extension but loses path separators and other characters
/// that are dangerous in storage paths.
///
/// # Example
///
/// ```text
/// object_key("missions/42", "trophy photo.png", 1700000000000)
/// // => "missions/42/1700000000000-trophy photo.png"
/// ```
pub fn object_key(folder: &str, file_name: &str, timestamp_ms: i64) -> String {
    let folder = sanitize_folder(folder);
    let file_name = sanitize_filename(file_name);
    format!("{}/{}-{}", folder, timestamp_ms, file_name)
}

/// Sanitizes a folder path, keeping `/` as a segment separator.
///
/// Empty or fully-filtered folders fall back to the default upload folder.
fn sanitize_folder(folder: &str) -> String {
    let cleaned: Vec<String> = folder
        .split('/')
        .map(sanitize_path_component)
        .filter(|segment| !segment.is_empty())
        .collect();

    if cleaned.is_empty() {
        DEFAULT_UPLOAD_FOLDER.to_string()
    } else {
        cleaned.join("/")
    }
}

/// Sanitizes a single path component to prevent traversal and storage-unsafe
/// characters.
fn sanitize_path_component(component: &str) -> String {
    component
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(50)
        .collect::<String>()
        .to_lowercase()
}

/// Sanitizes a filename while preserving the file extension.
fn sanitize_filename(filename: &str) -> String {
    let filename = filename.trim();

    let safe_chars: String = filename
        .chars()
        .filter(|c| !"/\\:*?\"<>|".contains(*c))
        .take(255)
        .collect();

    if safe_chars.is_empty() {
        "unknown".to_string()
    } else {
        safe_chars
    }
}

/// Creates the CORS headers applied to every API response.
///
/// The configuration allows all origins; the API carries no credentials and
/// the hosted client may be served from a different subdomain.
pub fn cors_headers() -> Headers {
    let headers = Headers::new();
    // Note: These values are known to be valid
    let _ = headers.set("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN);
    let _ = headers.set("Access-Control-Allow-Methods", CORS_ALLOW_METHODS);
    let _ = headers.set("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_folder_timestamp_name() {
        assert_eq!(
            object_key("motivation", "clip.mp3", 1_700_000_000_000),
            "motivation/1700000000000-clip.mp3"
        );
    }

    #[test]
    fn object_key_keeps_mission_subfolders() {
        let key = object_key("missions/42", "trophy.png", 1);
        assert_eq!(key, "missions/42/1-trophy.png");
    }

    #[test]
    fn folder_traversal_is_stripped() {
        // ".." sanitizes to an empty segment and drops out
        let key = object_key("../secrets", "a.png", 1);
        assert_eq!(key, "secrets/1-a.png");
    }

    #[test]
    fn empty_folder_falls_back_to_default() {
        let key = object_key("..", "a.png", 1);
        assert_eq!(key, "motivation/1-a.png");
    }

    #[test]
    fn filename_loses_separators_but_keeps_extension() {
        let key = object_key("motivation", "..\\..\\evil name.png", 1);
        assert_eq!(key, "motivation/1-....evil name.png");
    }

    #[test]
    fn unusable_filename_becomes_unknown() {
        let key = object_key("motivation", "///", 1);
        assert_eq!(key, "motivation/1-unknown");
    }
}
