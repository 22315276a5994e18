//! Image sync: mirror the source tree into the public tree and write the manifest.
//!
//! One run, in order:
//!
//! 1. Create the source, destination and manifest directories; reject
//!    overlapping source and destination.
//! 2. Thumbnail step ([`crate::thumbnails`]). Failure is a warning.
//! 3. Clear the destination (the keep-file survives), copy the source tree
//!    without its root `thumbnails/`, then copy `thumbnails/` without the
//!    thumbnail cache manifest.
//! 4. Scan and sort images ([`crate::scan`]). Paths that fail
//!    [`is_safe_relative_path`] are skipped with a warning.
//! 5. Build one descriptor per image: thumbnail path when the file exists
//!    (`thumbnails/!a.jpg`, else `thumbnails/a.jpg` for a featured image),
//!    EXIF date and fields when metadata is enabled. Metadata is read in
//!    parallel; output order is the scan order.
//! 6. Write `images-manifest.json`, only when its bytes changed.
//!
//! ```text
//! images/                       public/
//! ├── .gitkeep                  ├── images/
//! ├── !a.jpg          ──sync──▶ │   ├── .gitkeep
//! ├── trips/b.png               │   ├── !a.jpg
//! └── thumbnails/               │   ├── trips/b.png
//!     ├── !a.jpg                │   └── thumbnails/{!a.jpg, trips/b.jpg}
//!     └── trips/b.jpg           └── images-manifest.json
//! ```
//!
//! Progress is reported as [`SyncEvent`]s over an optional channel so the CLI
//! can print from its own thread while rayon workers run.

use crate::cache;
use crate::config::{GalleryConfig, SiteLayout};
use crate::imaging::ImageBackend;
use crate::manifest::{ImageDescriptor, Manifest};
use crate::metadata;
use crate::paths::{THUMBNAILS_DIR, is_safe_relative_path, thumbnail_candidates};
use crate::scan::{ScanError, ScannedImage, scan_images};
use crate::thumbnails::{ThumbnailOutcome, run_thumbnail_step};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Source {source_dir} and destination {dest_dir} overlap")]
    Overlap { source_dir: PathBuf, dest_dir: PathBuf },
}

/// Switches the CLI can flip for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub thumbnails: bool,
    pub metadata: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            thumbnails: true,
            metadata: true,
        }
    }
}

/// Progress reported while a sync runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    ThumbnailsDone(ThumbnailOutcome),
    Copied { files: usize },
    ImageListed {
        index: usize,
        rel_path: String,
        featured: bool,
        has_thumb: bool,
        date: Option<String>,
    },
    Warning(String),
    ManifestWritten { path: PathBuf, images: usize, changed: bool },
}

/// What a finished sync did.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub images: usize,
    pub featured: usize,
    pub copied_files: usize,
    pub manifest_changed: bool,
    pub thumbnails: ThumbnailOutcome,
    pub warnings: Vec<String>,
}

/// Forwards events to an optional channel and keeps the warnings.
struct Reporter {
    events: Option<Sender<SyncEvent>>,
    warnings: Vec<String>,
}

impl Reporter {
    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            // A closed printer must not fail the sync.
            let _ = tx.send(event);
        }
    }

    fn warn(&mut self, message: String) {
        self.emit(SyncEvent::Warning(message.clone()));
        self.warnings.push(message);
    }
}

/// Run a full sync for the project at `root`.
pub fn sync(
    root: &Path,
    config: &GalleryConfig,
    backend: &impl ImageBackend,
    options: SyncOptions,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncReport, SyncError> {
    let layout = config.layout(root);
    let mut reporter = Reporter {
        events,
        warnings: Vec::new(),
    };

    prepare_dirs(&layout)?;

    let thumbnails = if options.thumbnails {
        match run_thumbnail_step(backend, &config.thumbnails, &config.keep_file, &layout.source_dir) {
            Ok(outcome) => {
                if let ThumbnailOutcome::Builtin(summary) = &outcome {
                    for failure in &summary.failed {
                        reporter.warn(format!("thumbnail failed for {}: {}", failure.rel_path, failure.reason));
                    }
                }
                outcome
            }
            Err(e) => {
                reporter.warn(format!("thumbnail step failed: {e}"));
                ThumbnailOutcome::Disabled
            }
        }
    } else {
        ThumbnailOutcome::Disabled
    };
    reporter.emit(SyncEvent::ThumbnailsDone(thumbnails.clone()));

    clean_dest(&layout.public_images_dir, &config.keep_file)?;
    let copied_files = mirror_tree(&layout.source_dir, &layout.public_images_dir)?;
    reporter.emit(SyncEvent::Copied { files: copied_files });

    let (images, unsafe_images): (Vec<ScannedImage>, Vec<ScannedImage>) =
        scan_images(&layout.source_dir, &config.keep_file)?
            .into_iter()
            .partition(|image| is_safe_relative_path(&image.rel_path));
    for image in &unsafe_images {
        reporter.warn(format!("skipping {}: not a safe relative path", image.rel_path));
    }
    let read_metadata = options.metadata && config.metadata.enabled;
    let built: Vec<(ImageDescriptor, Option<String>)> = images
        .par_iter()
        .map(|image| build_descriptor(image, &layout.source_dir, backend, read_metadata, config.metadata.file_time_fallback))
        .collect();

    let mut descriptors = Vec::with_capacity(built.len());
    for (index, (image, (descriptor, warning))) in images.iter().zip(built).enumerate() {
        if let Some(message) = warning {
            reporter.warn(message);
        }
        if descriptor.thumb.is_none() {
            reporter.warn(format!("no thumbnail for {}", descriptor.path));
        }
        reporter.emit(SyncEvent::ImageListed {
            index: index + 1,
            rel_path: descriptor.path.clone(),
            featured: image.featured,
            has_thumb: descriptor.thumb.is_some(),
            date: descriptor.date.clone(),
        });
        descriptors.push(descriptor);
    }

    let manifest = Manifest { images: descriptors };
    let manifest_changed = write_if_changed(&layout.manifest_path, manifest.to_json_pretty()?.as_bytes())?;
    reporter.emit(SyncEvent::ManifestWritten {
        path: layout.manifest_path.clone(),
        images: manifest.images.len(),
        changed: manifest_changed,
    });

    Ok(SyncReport {
        images: images.len(),
        featured: images.iter().filter(|i| i.featured).count(),
        copied_files,
        manifest_changed,
        thumbnails,
        warnings: reporter.warnings,
    })
}

fn prepare_dirs(layout: &SiteLayout) -> Result<(), SyncError> {
    std::fs::create_dir_all(&layout.source_dir)?;
    std::fs::create_dir_all(&layout.public_images_dir)?;
    if let Some(parent) = layout.manifest_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let source_dir = layout.source_dir.canonicalize()?;
    let dest_dir = layout.public_images_dir.canonicalize()?;
    if source_dir.starts_with(&dest_dir) || dest_dir.starts_with(&source_dir) {
        return Err(SyncError::Overlap { source_dir, dest_dir });
    }
    Ok(())
}

/// Remove everything directly under `dest` except the keep-file.
fn clean_dest(dest: &Path, keep_file: &str) -> Result<(), SyncError> {
    if !dest.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dest)? {
        let entry = entry?;
        if entry.file_name() == keep_file {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Copy `source` into `dest`: everything except the root `thumbnails/`, then
/// `thumbnails/` without the cache manifest. Returns the number of files copied.
fn mirror_tree(source: &Path, dest: &Path) -> Result<usize, SyncError> {
    let mut copied = copy_filtered(source, dest, |rel| {
        !rel.components().next().is_some_and(|c| c.as_os_str() == THUMBNAILS_DIR)
    })?;

    let thumbs_src = source.join(THUMBNAILS_DIR);
    if thumbs_src.is_dir() {
        copied += copy_filtered(&thumbs_src, &dest.join(THUMBNAILS_DIR), |rel| {
            rel.as_os_str() != cache::MANIFEST_FILENAME
        })?;
    }
    Ok(copied)
}

/// Recursively copy files whose path relative to `source` passes `include`.
///
/// Excluded directories are not descended into.
fn copy_filtered(source: &Path, dest: &Path, include: impl Fn(&Path) -> bool) -> Result<usize, SyncError> {
    std::fs::create_dir_all(dest)?;
    let mut copied = 0;
    let walker = WalkDir::new(source)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.path().strip_prefix(source).map(&include).unwrap_or(false));

    for entry in walker {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Descriptor for one image, plus a metadata warning if extraction failed.
fn build_descriptor(
    image: &ScannedImage,
    source_dir: &Path,
    backend: &impl ImageBackend,
    read_metadata: bool,
    file_time_fallback: bool,
) -> (ImageDescriptor, Option<String>) {
    let mut descriptor = ImageDescriptor::bare(image.rel_path.clone());
    descriptor.thumb = thumbnail_candidates(&image.rel_path)
        .into_iter()
        .find(|candidate| source_dir.join(candidate).is_file());
    if !read_metadata {
        return (descriptor, None);
    }

    let modified = if file_time_fallback {
        std::fs::metadata(&image.abs_path).and_then(|m| m.modified()).ok()
    } else {
        None
    };
    match backend.read_metadata(&image.abs_path) {
        Ok(exif) => {
            let summary = metadata::summarize(&exif, modified);
            descriptor.date = summary.date;
            descriptor.fields = summary.fields;
            (descriptor, None)
        }
        Err(e) => (descriptor, Some(format!("metadata unreadable for {}: {e}", image.rel_path))),
    }
}

/// Write `bytes` to `path` unless the file already holds exactly them.
fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<bool, SyncError> {
    if std::fs::read(path).is_ok_and(|existing| existing == bytes) {
        return Ok(false);
    }
    std::fs::write(path, bytes)?;
    Ok(true)
}
