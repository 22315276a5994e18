//! The image manifest: the only contract between the sync tool and the viewer.
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "path": "!a.jpg",
//!       "thumb": "thumbnails/!a.jpg",
//!       "date": "2024-05-01T10:20:30",
//!       "fields": [{ "label": "Camera", "value": "X100V" }]
//!     },
//!     "legacy/bare-path.jpg"
//!   ]
//! }
//! ```
//!
//! The writer always emits descriptor objects. Readers also accept the
//! legacy bare-string form. Reading is lenient per entry: an entry that is
//! malformed or carries an unsafe `path`/`thumb` is dropped on its own and
//! never poisons the rest of the manifest.

use crate::paths::is_safe_relative_path;
use serde::{Deserialize, Serialize};

/// The whole manifest file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub images: Vec<ImageDescriptor>,
}

/// One labelled metadata value shown in the viewer's dock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaField {
    pub label: String,
    pub value: String,
}

impl MetaField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Descriptor for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Relative path under the image root, `/`-separated.
    pub path: String,
    /// Relative thumbnail path, when one exists.
    pub thumb: Option<String>,
    /// ISO-8601 capture date.
    pub date: Option<String>,
    #[serde(default)]
    pub fields: Vec<MetaField>,
}

impl ImageDescriptor {
    /// Descriptor carrying only a path.
    pub fn bare(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            thumb: None,
            date: None,
            fields: Vec::new(),
        }
    }

    fn is_safe(&self) -> bool {
        is_safe_relative_path(&self.path)
            && self.thumb.as_deref().is_none_or(is_safe_relative_path)
    }
}

/// Either accepted entry shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ManifestEntry {
    Bare(String),
    Descriptor(LenientDescriptor),
}

/// Reader-side descriptor: `thumb`, `date` and `fields` may all be missing.
#[derive(Debug, Clone, Deserialize)]
struct LenientDescriptor {
    path: String,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    fields: Vec<MetaField>,
}

impl From<ManifestEntry> for ImageDescriptor {
    fn from(entry: ManifestEntry) -> Self {
        match entry {
            ManifestEntry::Bare(path) => ImageDescriptor::bare(path),
            ManifestEntry::Descriptor(d) => ImageDescriptor {
                path: d.path,
                thumb: d.thumb.filter(|t| !t.is_empty()),
                date: d.date.filter(|t| !t.is_empty()),
                fields: d.fields,
            },
        }
    }
}

impl Manifest {
    /// Parse manifest bytes, dropping any entry that is malformed or unsafe.
    ///
    /// Fails only when the bytes are not JSON at all. A missing or non-array
    /// `images` key yields an empty manifest.
    pub fn parse_lenient(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let root: serde_json::Value = serde_json::from_slice(bytes)?;
        let entries = match root.get("images") {
            Some(serde_json::Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let images = entries
            .into_iter()
            .filter_map(|item| serde_json::from_value::<ManifestEntry>(item).ok())
            .map(ImageDescriptor::from)
            .filter(ImageDescriptor::is_safe)
            .collect();
        Ok(Manifest { images })
    }

    /// Canonical serialized form: pretty JSON, two-space indent, trailing newline.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
