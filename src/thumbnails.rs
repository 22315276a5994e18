//! Thumbnail generation step of the sync pipeline.
//!
//! Thumbnails live in the source tree under `thumbnails/`, mirroring the image
//! layout with a `.jpg` extension (see [`thumbnail_path_for`]). The sync copies
//! them to the public tree and records them in the manifest, so any generator
//! only has to leave the files in place.
//!
//! Three generators are available, picked by `thumbnails.generator`:
//!
//! | Generator | Behaviour |
//! |---|---|
//! | `builtin` | [`BuiltinGenerator`]: decode, fit inside `max_size`, JPEG, in parallel |
//! | `command` | [`ExternalGenerator`]: run a program in the source directory |
//! | `none` | step skipped |
//!
//! The built-in generator consults the content-hash cache in [`crate::cache`]
//! so a resync only encodes photos that actually changed.

use crate::cache::{self, CacheStats, ThumbIndex, ThumbKey};
use crate::config::{GeneratorKind, ThumbnailsConfig};
use crate::imaging::{BackendError, ImageBackend, Quality, ThumbnailConfig, create_thumbnail};
use crate::paths::{THUMBNAILS_DIR, thumbnail_path_for};
use crate::scan::{ScanError, ScannedImage, scan_images};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Thumbnail program not found: {0}")]
    ProgramNotFound(String),
    #[error("Thumbnail program {program} exited with {status}")]
    ProgramFailed { program: String, status: String },
    #[error("No thumbnail command configured")]
    EmptyCommand,
}

/// One image the built-in generator could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailFailure {
    pub rel_path: String,
    pub reason: String,
}

/// What a thumbnail run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// `generator = "none"`, or disabled from the command line.
    Disabled,
    /// The external program exited successfully.
    External { program: String },
    Builtin(BuiltinSummary),
}

/// Per-image results of a built-in run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinSummary {
    pub cache: CacheStats,
    /// Images without a decoder (e.g. AVIF), or whose thumbnail path collides
    /// with an earlier image.
    pub skipped: Vec<String>,
    pub failed: Vec<ThumbnailFailure>,
    /// Previously generated thumbnails whose source is gone, now deleted.
    pub pruned: u32,
}

/// Something that leaves `thumbnails/` up to date for a source tree.
pub trait ThumbnailGenerator {
    fn generate(&self, source_dir: &Path) -> Result<ThumbnailOutcome, ThumbnailError>;
}

/// The generator for `generator = "none"`.
pub struct NoThumbnails;

impl ThumbnailGenerator for NoThumbnails {
    fn generate(&self, _source_dir: &Path) -> Result<ThumbnailOutcome, ThumbnailError> {
        Ok(ThumbnailOutcome::Disabled)
    }
}

/// Runs an external thumbnail program with the source directory as its
/// working directory.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalGenerator {
    /// Build from a `[program, args...]` list.
    pub fn from_command(command: &[String]) -> Result<Self, ThumbnailError> {
        let (program, args) = command.split_first().ok_or(ThumbnailError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ThumbnailGenerator for ExternalGenerator {
    fn generate(&self, source_dir: &Path) -> Result<ThumbnailOutcome, ThumbnailError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(source_dir)
            .status()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ThumbnailError::ProgramNotFound(self.program.clone()),
                _ => ThumbnailError::Io(e),
            })?;
        if !status.success() {
            return Err(ThumbnailError::ProgramFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(ThumbnailOutcome::External {
            program: self.program.clone(),
        })
    }
}

/// In-process generator on an [`ImageBackend`].
pub struct BuiltinGenerator<'a, B: ImageBackend> {
    pub backend: &'a B,
    pub config: ThumbnailConfig,
    pub keep_file: String,
}

/// Work item for one image.
struct Job<'s> {
    image: &'s ScannedImage,
    /// Path relative to `thumbnails/`, the index key.
    thumb_rel: String,
    output: PathBuf,
}

enum JobResult {
    Hit,
    Copied,
    Generated,
    Failed(ThumbnailFailure),
}

impl<'a, B: ImageBackend> BuiltinGenerator<'a, B> {
    pub fn new(backend: &'a B, config: &ThumbnailsConfig, keep_file: &str) -> Self {
        Self {
            backend,
            config: ThumbnailConfig {
                max_size: config.max_size,
                quality: Quality::new(config.quality),
            },
            keep_file: keep_file.to_string(),
        }
    }

    fn run_job(&self, job: &Job, index: &ThumbIndex, thumbs_dir: &Path, params_hash: &str) -> (JobResult, Option<ThumbKey>) {
        let fail = |reason: String| {
            JobResult::Failed(ThumbnailFailure {
                rel_path: job.image.rel_path.clone(),
                reason,
            })
        };
        let key = match cache::source_digest(&job.image.abs_path) {
            Ok(digest) => ThumbKey::new(digest, params_hash),
            Err(e) => return (fail(e.to_string()), None),
        };

        if let Some(stored) = index.lookup(&key, thumbs_dir) {
            if stored == job.thumb_rel {
                return (JobResult::Hit, Some(key));
            }
            let copied = job
                .output
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|_| std::fs::copy(thumbs_dir.join(stored), &job.output));
            if copied.is_ok() {
                return (JobResult::Copied, Some(key));
            }
        }

        match create_thumbnail(self.backend, &job.image.abs_path, &job.output, &self.config) {
            Ok(_) => (JobResult::Generated, Some(key)),
            Err(BackendError::Io(e)) => (fail(e.to_string()), None),
            Err(BackendError::ProcessingFailed(msg)) => (fail(msg), None),
        }
    }
}

impl<B: ImageBackend> ThumbnailGenerator for BuiltinGenerator<'_, B> {
    fn generate(&self, source_dir: &Path) -> Result<ThumbnailOutcome, ThumbnailError> {
        let thumbs_dir = source_dir.join(THUMBNAILS_DIR);
        let images = scan_images(source_dir, &self.keep_file)?;
        let decodable = self.backend.decodable_extensions();

        let mut summary = BuiltinSummary::default();
        let mut claimed = HashSet::new();
        let mut jobs = Vec::new();
        for image in &images {
            let ext = Path::new(&image.rel_path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();
            let thumb_path = thumbnail_path_for(&image.rel_path);
            let thumb_rel = thumb_path
                .strip_prefix(THUMBNAILS_DIR)
                .map(|p| p.trim_start_matches('/'))
                .unwrap_or(&thumb_path)
                .to_string();
            if !decodable.contains(&ext.as_str()) || !claimed.insert(thumb_rel.clone()) {
                summary.skipped.push(image.rel_path.clone());
                continue;
            }
            jobs.push(Job {
                image,
                output: thumbs_dir.join(&thumb_rel),
                thumb_rel,
            });
        }

        let mut index = ThumbIndex::load(&thumbs_dir);
        let previous: Vec<String> = index.paths().map(str::to_string).collect();
        let params_hash = cache::params_digest(self.config.max_size, self.config.quality.value());

        let results: Vec<(JobResult, Option<ThumbKey>)> = jobs
            .par_iter()
            .map(|job| self.run_job(job, &index, &thumbs_dir, &params_hash))
            .collect();

        let mut live = HashSet::new();
        for (job, (result, key)) in jobs.iter().zip(results) {
            if let Some(key) = key {
                index.record(&job.thumb_rel, key);
                live.insert(job.thumb_rel.clone());
            }
            match result {
                JobResult::Hit => summary.cache.hit(),
                JobResult::Copied => summary.cache.copy(),
                JobResult::Generated => summary.cache.miss(),
                JobResult::Failed(failure) => summary.failed.push(failure),
            }
        }
        for stale in previous.iter().filter(|p| !live.contains(*p) && !claimed.contains(*p)) {
            if std::fs::remove_file(thumbs_dir.join(stale)).is_ok() {
                summary.pruned += 1;
            }
        }
        index.retain(&live);
        index.save_if_dirty(&thumbs_dir)?;

        Ok(ThumbnailOutcome::Builtin(summary))
    }
}

/// Run the configured thumbnail step for `source_dir`.
pub fn run_thumbnail_step(
    backend: &impl ImageBackend,
    config: &ThumbnailsConfig,
    keep_file: &str,
    source_dir: &Path,
) -> Result<ThumbnailOutcome, ThumbnailError> {
    match config.generator {
        GeneratorKind::Disabled => NoThumbnails.generate(source_dir),
        GeneratorKind::Command => ExternalGenerator::from_command(&config.command)?.generate(source_dir),
        GeneratorKind::Builtin => BuiltinGenerator::new(backend, config, keep_file).generate(source_dir),
    }
}
