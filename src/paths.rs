//! Relative-path rules shared by the manifest writer and the catalog.
//!
//! Every path that crosses the manifest boundary is a forward-slash relative
//! path inside the image root. The viewer trusts nothing it reads back, so the
//! same [`is_safe_relative_path`] check guards both directions.

use std::path::Path;

use crate::naming::FEATURED_MARKER;

/// Directory (at the root of the source tree) holding generated thumbnails.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Extension every generated thumbnail carries.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Whether `path` is a relative path that cannot escape its root.
///
/// Rejects the empty string, absolute paths, backslashes, and any `..`
/// segment.
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return false;
    }
    !path.split('/').any(|segment| segment == "..")
}

/// Join the components of a relative filesystem path with `/`.
///
/// Returns `None` for non-UTF-8 components.
pub fn to_url_path(rel: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    parts.map(|p| p.join("/"))
}

/// Photo id for a relative path: the path, percent-encoded as one component.
///
/// Matches the browser's `encodeURIComponent`: `!'()*` stay literal, so
/// `!a.jpg` keeps its marker visible in the address bar.
pub fn encode_id(rel_path: &str) -> String {
    // Every literal '%' is emitted as %25, so these sequences only come from
    // the characters being restored.
    urlencoding::encode(rel_path)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Decode a photo id and re-validate it. `None` when undecodable or unsafe.
pub fn decode_id(id: &str) -> Option<String> {
    let decoded = urlencoding::decode(id).ok()?.into_owned();
    is_safe_relative_path(&decoded).then_some(decoded)
}

/// Thumbnail path for an image: `thumbnails/<rel>` with the extension of the
/// last segment replaced by `jpg` (appended when there is none).
///
/// - `"!a.jpg"` → `"thumbnails/!a.jpg"`
/// - `"trips/b.png"` → `"thumbnails/trips/b.jpg"`
pub fn thumbnail_path_for(rel_path: &str) -> String {
    let (dir, file) = match rel_path.rfind('/') {
        Some(idx) => (&rel_path[..=idx], &rel_path[idx + 1..]),
        None => ("", rel_path),
    };
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    format!("{THUMBNAILS_DIR}/{dir}{stem}.{THUMBNAIL_EXTENSION}")
}

/// Thumbnail paths to look for, in order of preference.
///
/// The first is [`thumbnail_path_for`]. For a featured image a second
/// candidate drops the marker, so a hand-made `thumbnails/a.jpg` still serves
/// `!a.jpg`.
pub fn thumbnail_candidates(rel_path: &str) -> Vec<String> {
    let mut candidates = vec![thumbnail_path_for(rel_path)];
    let (dir, file) = match rel_path.rfind('/') {
        Some(idx) => (&rel_path[..=idx], &rel_path[idx + 1..]),
        None => ("", rel_path),
    };
    match file.strip_prefix(FEATURED_MARKER) {
        Some(unmarked) if !unmarked.is_empty() => {
            candidates.push(thumbnail_path_for(&format!("{dir}{unmarked}")));
        }
        _ => {}
    }
    candidates
}

/// URL under which the viewer requests a mirrored file.
pub fn public_url(base: &str, rel_path: &str) -> String {
    format!("{base}{rel_path}")
}
