//! Source tree scanning.
//!
//! Walks the source directory and lists every publishable image as a
//! forward-slash relative path, ordered the way the gallery shows them.
//!
//! ```text
//! images/                          # source_dir
//! ├── .gitkeep                     # keep-file: never listed
//! ├── !sunset.jpg                  # listed, featured
//! ├── notes.txt                    # not an image: copied, never listed
//! ├── trips/
//! │   ├── img2.jpg                 # listed before img10.jpg
//! │   └── img10.jpg
//! └── thumbnails/                  # generated: never listed
//!     └── ...
//! ```
//!
//! Only the root-level `thumbnails` directory is excluded; a `thumbnails`
//! folder deeper in the tree is ordinary content.

use crate::naming::{natural_cmp, parse_file_name};
use crate::paths::{to_url_path, THUMBNAILS_DIR};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions (lower-cased) that make a file a publishable image.
pub const IMAGE_EXTENSIONS: &[&str] = &["avif", "gif", "jpeg", "jpg", "png", "webp"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}

/// One image found in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImage {
    /// `/`-separated path relative to the source root.
    pub rel_path: String,
    /// Absolute path on disk.
    pub abs_path: PathBuf,
    /// File name with the featured marker stripped.
    pub display_name: String,
    pub featured: bool,
}

/// Whether a path's extension marks it as a publishable image.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List every image under `root`, sorted by display name (numeric-aware),
/// ties broken by relative path.
///
/// A missing root yields an empty list.
pub fn scan_images(root: &Path, keep_file: &str) -> Result<Vec<ScannedImage>, ScanError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut images = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == THUMBNAILS_DIR));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() == keep_file {
            continue;
        }
        let path = entry.path();
        if !is_image_path(path) {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(path);
        let rel_path = to_url_path(rel).ok_or_else(|| ScanError::NonUtf8Path(path.to_path_buf()))?;
        let parsed = parse_file_name(&rel_path);
        images.push(ScannedImage {
            rel_path,
            abs_path: path.to_path_buf(),
            display_name: parsed.display_name,
            featured: parsed.featured,
        });
    }

    sort_images(&mut images);
    Ok(images)
}

/// Gallery order: display name first, relative path as tiebreak.
pub fn sort_images(images: &mut [ScannedImage]) {
    images.sort_by(|a, b| {
        natural_cmp(&a.display_name, &b.display_name).then_with(|| natural_cmp(&a.rel_path, &b.rel_path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn rel_paths(images: &[ScannedImage]) -> Vec<&str> {
        images.iter().map(|i| i.rel_path.as_str()).collect()
    }

    #[test]
    fn lists_only_image_extensions() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.jpg", "b.PNG", "c.webp", "d.avif", "e.gif", "f.jpeg", "notes.txt", "raw.cr2"] {
            write_file(tmp.path(), name, b"x");
        }
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(
            rel_paths(&images),
            vec!["a.jpg", "b.PNG", "c.webp", "d.avif", "e.gif", "f.jpeg"]
        );
    }

    #[test]
    fn skips_keep_file_and_root_thumbnails() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), ".gitkeep", b"");
        write_file(tmp.path(), "a.jpg", b"x");
        write_file(tmp.path(), "thumbnails/a.jpg", b"x");
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(rel_paths(&images), vec!["a.jpg"]);
    }

    #[test]
    fn nested_thumbnails_folder_is_content() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "trips/thumbnails/x.jpg", b"x");
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(rel_paths(&images), vec!["trips/thumbnails/x.jpg"]);
    }

    #[test]
    fn featured_marker_parsed() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "!sunset.jpg", b"x");
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(images[0].rel_path, "!sunset.jpg");
        assert_eq!(images[0].display_name, "sunset.jpg");
        assert!(images[0].featured);
    }

    #[test]
    fn sorted_numerically_by_display_name() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "trips/img10.jpg", b"x");
        write_file(tmp.path(), "img2.jpg", b"x");
        write_file(tmp.path(), "!img1.jpg", b"x");
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(
            rel_paths(&images),
            vec!["!img1.jpg", "img2.jpg", "trips/img10.jpg"]
        );
    }

    #[test]
    fn same_display_name_ordered_by_path() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "b/a.jpg", b"x");
        write_file(tmp.path(), "a/a.jpg", b"x");
        let images = scan_images(tmp.path(), ".gitkeep").unwrap();
        assert_eq!(rel_paths(&images), vec!["a/a.jpg", "b/a.jpg"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let images = scan_images(&tmp.path().join("nope"), ".gitkeep").unwrap();
        assert!(images.is_empty());
    }
}
