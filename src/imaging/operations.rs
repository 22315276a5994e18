//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::params::{FLATTEN_BACKGROUND, FrameParams, Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    /// Thumbnails fit inside `max_size x max_size`.
    pub max_size: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_size: 720,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    source_dims: Dimensions,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (width, height) = fit_within(
        (source_dims.width, source_dims.height),
        (config.max_size, config.max_size),
    );
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        quality: config.quality,
        background: FLATTEN_BACKGROUND,
    }
}

/// Identify the source, then write its thumbnail. Returns the thumbnail size.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> Result<Dimensions> {
    let dims = backend.identify(source)?;
    let params = plan_thumbnail(source, output_path, dims, config);
    backend.thumbnail(&params)?;
    Ok(Dimensions {
        width: params.width,
        height: params.height,
    })
}

/// Default border thickness of a framed export, in source pixels.
pub const DEFAULT_FRAME_BORDER: u32 = 96;
/// Longest side a framed export may have.
pub const FRAME_MAX_SIDE: u32 = 12000;
/// JPEG quality of framed exports.
pub const FRAME_QUALITY: u32 = 95;

/// Write a framed export of `source` to `output_path`. Returns the canvas size.
pub fn create_framed(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    border_px: u32,
) -> Result<Dimensions> {
    backend.frame(&FrameParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        border_px,
        max_side: FRAME_MAX_SIDE,
        quality: Quality::new(FRAME_QUALITY),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn plan_thumbnail_fits_inside_max_size() {
        let params = plan_thumbnail(
            Path::new("/src/a.jpg"),
            Path::new("/thumbs/a.jpg"),
            Dimensions {
                width: 4000,
                height: 3000,
            },
            &ThumbnailConfig::default(),
        );
        assert_eq!((params.width, params.height), (720, 540));
        assert_eq!(params.quality.value(), 85);
        assert_eq!(params.background, [255, 255, 255]);
    }

    #[test]
    fn plan_thumbnail_keeps_small_sources() {
        let params = plan_thumbnail(
            Path::new("/src/a.jpg"),
            Path::new("/thumbs/a.jpg"),
            Dimensions {
                width: 300,
                height: 500,
            },
            &ThumbnailConfig::default(),
        );
        assert_eq!((params.width, params.height), (300, 500));
    }

    #[test]
    fn create_thumbnail_identifies_then_writes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1440,
            height: 2880,
        }]);
        let output = tmp.path().join("a.jpg");
        let dims =
            create_thumbnail(&backend, Path::new("/src/a.png"), &output, &ThumbnailConfig::default())
                .unwrap();
        assert_eq!(dims, Dimensions { width: 360, height: 720 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/src/a.png"));
        assert!(matches!(
            &ops[1],
            RecordedOp::Thumbnail {
                width: 360,
                height: 720,
                ..
            }
        ));
    }

    #[test]
    fn create_thumbnail_propagates_identify_failure() {
        let backend = MockBackend::failing_on(&["bad.jpg"]);
        let result = create_thumbnail(
            &backend,
            Path::new("/src/bad.jpg"),
            Path::new("/thumbs/bad.jpg"),
            &ThumbnailConfig::default(),
        );
        assert!(result.is_err());
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn create_framed_passes_border() {
        let backend = MockBackend::new();
        create_framed(&backend, Path::new("/src/a.jpg"), Path::new("/out/f.jpg"), 96).unwrap();
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Frame { border_px: 96, .. }
        ));
    }
}
