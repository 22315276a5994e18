//! The seam between the sync/export code and actual pixel work.
//!
//! Everything that decodes or encodes a photo goes through [`ImageBackend`].
//! [`RustBackend`](super::rust_backend::RustBackend) does it with the `image`
//! crate; unit tests use a mock that only records what was asked of it.

use super::exif_parser::ExifData;
use super::params::{FrameParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Pixel operations needed by the thumbnail step, metadata extraction and
/// framed export.
///
/// Implementations must be `Sync`: the thumbnail step and metadata
/// extraction call them from rayon workers.
pub trait ImageBackend: Sync {
    /// Pixel size, read from the header where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read embedded EXIF metadata. A file without EXIF is not an error.
    fn read_metadata(&self, path: &Path) -> Result<ExifData, BackendError>;

    /// Write a thumbnail (downscale, flatten alpha, encode JPEG).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Write a framed export (blurred matte border, encode JPEG).
    fn frame(&self, params: &FrameParams) -> Result<Dimensions, BackendError>;

    /// Lower-cased extensions this backend can decode.
    fn decodable_extensions(&self) -> &'static [&'static str];
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call instead of touching pixels. State sits behind
    /// `Mutex` because the thumbnail step calls it from rayon workers.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub metadata_results: Mutex<Vec<ExifData>>,
        /// File names whose operations fail.
        pub failing: Vec<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        ReadMetadata(String),
        Thumbnail {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
        Frame {
            source: String,
            output: String,
            border_px: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn with_metadata(metadata: Vec<ExifData>) -> Self {
            Self {
                metadata_results: Mutex::new(metadata),
                ..Self::default()
            }
        }

        pub fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn check_failure(&self, path: &Path) -> Result<(), BackendError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if self.failing.contains(&name) {
                return Err(BackendError::ProcessingFailed(format!("mock failure: {name}")));
            }
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));
            self.check_failure(path)?;

            Ok(self
                .identify_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Dimensions {
                    width: 1600,
                    height: 1200,
                }))
        }

        fn read_metadata(&self, path: &Path) -> Result<ExifData, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::ReadMetadata(path.to_string_lossy().to_string()));
            self.check_failure(path)?;

            Ok(self
                .metadata_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_default())
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            self.check_failure(&params.source)?;
            if let Some(parent) = params.output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&params.output, b"mock thumbnail")?;
            Ok(())
        }

        fn frame(&self, params: &FrameParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Frame {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                border_px: params.border_px,
            });
            self.check_failure(&params.source)?;
            Ok(Dimensions {
                width: 1600 + params.border_px * 2,
                height: 1200 + params.border_px * 2,
            })
        }

        fn decodable_extensions(&self) -> &'static [&'static str] {
            &["jpg", "jpeg", "png", "webp", "gif"]
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_fails_on_request() {
        let backend = MockBackend::failing_on(&["bad.jpg"]);
        assert!(backend.read_metadata(Path::new("/x/bad.jpg")).is_err());
        assert!(backend.read_metadata(Path::new("/x/good.jpg")).is_ok());
    }

    #[test]
    fn mock_thumbnail_writes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("thumbnails/a.jpg");
        let backend = MockBackend::new();
        backend
            .thumbnail(&ThumbnailParams {
                source: "/source.jpg".into(),
                output: output.clone(),
                width: 720,
                height: 540,
                quality: super::super::params::Quality::new(85),
                background: [255, 255, 255],
            })
            .unwrap();
        assert!(output.exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Thumbnail {
                width: 720,
                height: 540,
                quality: 85,
                ..
            }
        ));
    }
}
