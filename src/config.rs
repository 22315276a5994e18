//! Project configuration module.
//!
//! Handles loading, validating, and merging `gallery.toml`. Configuration is
//! layered: stock defaults first, then the project file on top. The file lives
//! in the project root (the directory passed with `--root`):
//!
//! ```text
//! project/
//! ├── gallery.toml                 # Optional, overrides stock defaults
//! ├── images/                      # source_dir: photos, grouped freely
//! │   ├── .gitkeep
//! │   ├── !sunset.jpg              # "!" marks a featured photo
//! │   ├── trips/img2.jpg
//! │   └── thumbnails/              # generated, mirrors the tree as .jpg
//! └── public/                      # site_root
//!     ├── images/                  # images_dir: mirrored copy
//!     └── images-manifest.json     # manifest_file
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # every key is optional, values shown are the defaults
//! source_dir = "images"
//! site_root = "public"
//! images_dir = "images"
//! manifest_file = "images-manifest.json"
//! keep_file = ".gitkeep"
//!
//! [thumbnails]
//! generator = "builtin"     # builtin | command | none
//! command = ["python3", "generate_thumbs.py"]
//! max_size = 720
//! quality = 85
//!
//! [metadata]
//! enabled = true
//! file_time_fallback = true
//!
//! [watch]
//! debounce_ms = 220
//!
//! [processing]
//! max_processes = 4         # omit for auto = CPU cores
//! ```
//!
//! A misspelled key is an error, not a silently ignored setting.

use crate::paths::is_safe_relative_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `gallery.toml`.
///
/// All fields have defaults matching the conventional layout shown in the
/// module docs. Paths are relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory holding the original photos.
    pub source_dir: String,
    /// Root of the static site that gets published.
    pub site_root: String,
    /// Mirrored image directory, relative to `site_root`. Also the URL prefix.
    pub images_dir: String,
    /// Manifest file, relative to `site_root`. Also its URL.
    pub manifest_file: String,
    /// Sentinel file kept in otherwise empty directories; never listed.
    pub keep_file: String,
    pub thumbnails: ThumbnailsConfig,
    pub metadata: MetadataConfig,
    pub watch: WatchConfig,
    pub processing: ProcessingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            source_dir: "images".to_string(),
            site_root: "public".to_string(),
            images_dir: "images".to_string(),
            manifest_file: "images-manifest.json".to_string(),
            keep_file: ".gitkeep".to_string(),
            thumbnails: ThumbnailsConfig::default(),
            metadata: MetadataConfig::default(),
            watch: WatchConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Reject settings the sync cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source_dir must not be empty".into(),
            ));
        }
        if self.site_root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site_root must not be empty".into(),
            ));
        }
        if !is_safe_relative_path(&self.images_dir) {
            return Err(ConfigError::Validation(format!(
                "images_dir must be a relative path inside site_root, got {:?}",
                self.images_dir
            )));
        }
        if !is_safe_relative_path(&self.manifest_file) {
            return Err(ConfigError::Validation(format!(
                "manifest_file must be a relative path inside site_root, got {:?}",
                self.manifest_file
            )));
        }
        if self.keep_file.is_empty() || self.keep_file.contains('/') {
            return Err(ConfigError::Validation(
                "keep_file must be a plain file name".into(),
            ));
        }
        if self.thumbnails.max_size == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_size must be non-zero".into(),
            ));
        }
        if self.thumbnails.quality == 0 || self.thumbnails.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.generator == GeneratorKind::Command
            && self.thumbnails.command.is_empty()
        {
            return Err(ConfigError::Validation(
                "thumbnails.command must name a program when generator = \"command\"".into(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every configured location against the project root.
    pub fn layout(&self, root: &Path) -> SiteLayout {
        let site_root = root.join(&self.site_root);
        SiteLayout {
            source_dir: root.join(&self.source_dir),
            public_images_dir: site_root.join(&self.images_dir),
            manifest_path: site_root.join(&self.manifest_file),
            site_root,
        }
    }

    /// URL prefix of mirrored images as the viewer requests them.
    pub fn images_url_base(&self) -> String {
        format!("./{}/", self.images_dir.trim_end_matches('/'))
    }

    /// URL of the manifest as the viewer requests it.
    pub fn manifest_url(&self) -> String {
        format!("./{}", self.manifest_file)
    }
}

/// Absolute (root-joined) locations derived from a [`GalleryConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub source_dir: PathBuf,
    pub site_root: PathBuf,
    pub public_images_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Which thumbnail generator the sync runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// In-process thumbnailer on the `image` crate.
    Builtin,
    /// External program, run with the source directory as working directory.
    Command,
    /// Skip the thumbnail step.
    #[serde(rename = "none")]
    Disabled,
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub generator: GeneratorKind,
    /// Program and arguments for `generator = "command"`.
    pub command: Vec<String>,
    /// Thumbnails fit inside `max_size x max_size`.
    pub max_size: u32,
    /// JPEG quality (1-100).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorKind::Builtin,
            command: vec!["python3".to_string(), "generate_thumbs.py".to_string()],
            max_size: 720,
            quality: 85,
        }
    }
}

/// EXIF extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Extract capture date and camera fields into the manifest.
    pub enabled: bool,
    /// Use the file modification time when no EXIF date is present.
    pub file_time_fallback: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_time_fallback: true,
        }
    }
}

/// Watch mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last file-system event before a resync.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 220 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: every core unless `max_processes`
/// asks for fewer. Asking for more than the machine has gets the core count.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    config.max_processes.map_or(cores, |n| n.clamp(1, cores))
}

// =============================================================================
// Loading: stock defaults, then gallery.toml on top
// =============================================================================

/// [`GalleryConfig::default`] as a TOML table, the base layer.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GalleryConfig::default())?)
}

/// Lay `overlay` over `base`. Tables merge per key and recurse; any other
/// overlay value wins outright, so arrays are replaced rather than joined.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// The project's `gallery.toml` as an untyped table, or `None` when the
/// project has no config file.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(&path)?)?))
}

/// Typed, validated config from a base layer and an optional project layer.
pub fn resolve_config(base: toml::Value, project: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let layered = match project {
        Some(project) => merge_toml(base, project),
        None => base,
    };
    let config: GalleryConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `gallery.toml` in the project root.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Commented `gallery.toml` listing every key at its default, printed by
/// `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Mosaic Gallery Configuration
# ============================
# Every setting is optional; delete the ones you don't change.
# Values shown below are the defaults. Paths are relative to the directory
# holding this file. Unknown keys will cause an error.

# Directory holding the original photos. Prefix a file name with "!" to
# feature it in the gallery (the marker is hidden from visitors).
source_dir = "images"

# Root of the published static site.
site_root = "public"

# Where photos are mirrored, relative to site_root. Also the URL prefix.
images_dir = "images"

# The manifest the viewer fetches, relative to site_root.
manifest_file = "images-manifest.json"

# Sentinel file that keeps empty directories in version control.
keep_file = ".gitkeep"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# builtin: resize in-process. command: run an external program inside
# source_dir. none: skip the step and use whatever thumbnails exist.
generator = "builtin"

# Program and arguments for generator = "command".
command = ["python3", "generate_thumbs.py"]

# Thumbnails fit inside max_size x max_size pixels (never upscaled).
max_size = 720

# JPEG quality (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Read EXIF capture date, camera, lens and exposure into the manifest.
enabled = true

# Fall back to the file modification time when a photo has no EXIF date.
file_time_fallback = true

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Quiet period in milliseconds after the last change before resyncing.
debounce_ms = 220

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for thumbnails and metadata.
# Leave unset to use one worker per CPU core.
# max_processes = 4
"##
}
