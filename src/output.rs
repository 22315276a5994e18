//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each image leads with
//! its positional index and display name (featured images marked `★`), and
//! the paths behind it follow as indented context lines. The same two-level
//! pattern is used by `sync`, `check` and `catalog`, so one image looks the
//! same whichever command printed it.
//!
//! # Output Format
//!
//! ## Sync
//!
//! ```text
//! Thumbnails
//!     3 cached, 1 generated (4 total)
//!     Skipped: raw/scan.avif
//! Copied 9 files
//! Images
//! 001 ★ a.jpg (2024-05-01)
//!     Source: !a.jpg
//!     Thumbnail: thumbnails/!a.jpg
//! 002 b.png
//!     Source: trips/b.png
//!     Thumbnail: none
//! Manifest
//!     public/images-manifest.json (written, 2 images)
//! ```
//!
//! Warnings go to stderr as `warning: ...` lines.
//!
//! ## Catalog
//!
//! ```text
//! 001 ★ a.jpg (2024-05-01)
//!     Id: !a.jpg
//!     Url: ./images/!a.jpg
//!     Thumbnail: ./images/thumbnails/!a.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::catalog::Photo;
use crate::frame::FramedExport;
use crate::metadata::format_date_label;
use crate::scan::ScannedImage;
use crate::sync::{SyncEvent, SyncReport};
use crate::thumbnails::ThumbnailOutcome;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an image header: index, featured star, name, optional date.
///
/// ```text
/// 001 ★ a.jpg (2024-05-01)
/// 002 b.png
/// ```
fn image_line(index: usize, name: &str, featured: bool, date: Option<&str>) -> String {
    let star = if featured { "\u{2605} " } else { "" };
    match date.and_then(format_date_label) {
        Some(day) => format!("{} {}{} ({})", format_index(index), star, name, day),
        None => format!("{} {}{}", format_index(index), star, name),
    }
}

/// Last path segment, without the featured marker.
fn display_name(rel_path: &str) -> &str {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.strip_prefix('!').unwrap_or(name)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Thumbnails
// ============================================================================

/// Format the result of the thumbnail step.
pub fn format_thumbnail_outcome(outcome: &ThumbnailOutcome) -> Vec<String> {
    let mut lines = vec!["Thumbnails".to_string()];
    match outcome {
        ThumbnailOutcome::Disabled => lines.push(format!("{}disabled", indent(1))),
        ThumbnailOutcome::External { program } => lines.push(format!("{}ran {}", indent(1), program)),
        ThumbnailOutcome::Builtin(summary) => {
            lines.push(format!("{}{}", indent(1), summary.cache));
            for skipped in &summary.skipped {
                lines.push(format!("{}Skipped: {}", indent(1), skipped));
            }
            for failure in &summary.failed {
                lines.push(format!("{}Failed: {} ({})", indent(1), failure.rel_path, failure.reason));
            }
            if summary.pruned > 0 {
                lines.push(format!("{}Pruned {}", indent(1), plural(summary.pruned as usize, "stale thumbnail")));
            }
        }
    }
    lines
}

pub fn print_thumbnail_outcome(outcome: &ThumbnailOutcome) {
    for line in format_thumbnail_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Sync
// ============================================================================

/// Format a single sync progress event as display lines.
///
/// The image list header is emitted together with the first image so the
/// printer stays stateless.
pub fn format_sync_event(event: &SyncEvent) -> Vec<String> {
    match event {
        SyncEvent::ThumbnailsDone(outcome) => format_thumbnail_outcome(outcome),
        SyncEvent::Copied { files } => vec![format!("Copied {}", plural(*files, "file"))],
        SyncEvent::ImageListed {
            index,
            rel_path,
            featured,
            has_thumb,
            date,
        } => {
            let mut lines = Vec::new();
            if *index == 1 {
                lines.push("Images".to_string());
            }
            lines.push(image_line(*index, display_name(rel_path), *featured, date.as_deref()));
            lines.push(format!("{}Source: {}", indent(1), rel_path));
            let thumb = if *has_thumb {
                crate::paths::thumbnail_path_for(rel_path)
            } else {
                "none".to_string()
            };
            lines.push(format!("{}Thumbnail: {}", indent(1), thumb));
            lines
        }
        SyncEvent::Warning(message) => vec![format!("warning: {}", message)],
        SyncEvent::ManifestWritten { path, images, changed } => {
            let status = if *changed { "written" } else { "unchanged" };
            vec![
                "Manifest".to_string(),
                format!("{}{} ({}, {})", indent(1), path.display(), status, plural(*images, "image")),
            ]
        }
    }
}

/// Print one event: warnings to stderr, everything else to stdout.
pub fn print_sync_event(event: &SyncEvent) {
    let warning = matches!(event, SyncEvent::Warning(_));
    for line in format_sync_event(event) {
        if warning {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// One-line summary after a sync.
pub fn format_sync_summary(report: &SyncReport) -> Vec<String> {
    let mut summary = format!("Synced {}", plural(report.images, "image"));
    if report.featured > 0 {
        summary.push_str(&format!(" ({} featured)", report.featured));
    }
    if !report.warnings.is_empty() {
        summary.push_str(&format!(", {}", plural(report.warnings.len(), "warning")));
    }
    vec![summary]
}

pub fn print_sync_summary(report: &SyncReport) {
    for line in format_sync_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the images a sync would list, without touching anything.
pub fn format_check_output(images: &[ScannedImage]) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    for (i, image) in images.iter().enumerate() {
        lines.push(image_line(i + 1, &image.display_name, image.featured, None));
        lines.push(format!("{}Source: {}", indent(1), image.rel_path));
    }
    let featured = images.iter().filter(|i| i.featured).count();
    lines.push(format!("Found {} ({} featured)", plural(images.len(), "image"), featured));
    lines
}

pub fn print_check_output(images: &[ScannedImage]) {
    for line in format_check_output(images) {
        println!("{}", line);
    }
}

// ============================================================================
// Catalog
// ============================================================================

fn photo_lines(index: usize, photo: &Photo) -> Vec<String> {
    let mut lines = vec![
        image_line(index, &photo.file_name, photo.is_featured, photo.date.as_deref()),
        format!("{}Id: {}", indent(1), photo.id),
        format!("{}Url: {}", indent(1), photo.url),
    ];
    if let Some(thumb) = &photo.thumb_url {
        lines.push(format!("{}Thumbnail: {}", indent(1), thumb));
    }
    lines
}

/// Format the catalog as the viewer would list it.
pub fn format_catalog(photos: &[Photo]) -> Vec<String> {
    if photos.is_empty() {
        return vec![crate::gallery::EMPTY_TITLE.to_string()];
    }
    photos
        .iter()
        .enumerate()
        .flat_map(|(i, photo)| photo_lines(i + 1, photo))
        .collect()
}

pub fn print_catalog(photos: &[Photo]) {
    for line in format_catalog(photos) {
        println!("{}", line);
    }
}

/// Format one photo with its metadata fields.
pub fn format_photo_detail(photo: &Photo) -> Vec<String> {
    let mut lines = photo_lines(1, photo);
    for field in &photo.fields {
        lines.push(format!("{}{}: {}", indent(1), field.label, field.value));
    }
    lines
}

pub fn print_photo_detail(photo: &Photo) {
    for line in format_photo_detail(photo) {
        println!("{}", line);
    }
}

// ============================================================================
// Frame
// ============================================================================

pub fn format_frame_export(export: &FramedExport) -> Vec<String> {
    vec![format!(
        "Framed {}x{} \u{2192} {}",
        export.dimensions.width,
        export.dimensions.height,
        export.path.display()
    )]
}

pub fn print_frame_export(export: &FramedExport) {
    for line in format_frame_export(export) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
