//! Framed export: the viewer's download, and the `frame` command.
//!
//! The picture is written with a blurred matte border (see
//! [`create_framed`]) under a name taken from the local time of the export,
//! `YYYYMMDDHHMMSSmmm.jpg`, so consecutive downloads never collide in a
//! browser's download folder.

use crate::imaging::{BackendError, Dimensions, ImageBackend, create_framed};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// A written export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedExport {
    pub path: PathBuf,
    pub dimensions: Dimensions,
}

pub fn download_file_name(now: DateTime<Local>) -> String {
    format!("{}.jpg", now.format("%Y%m%d%H%M%S%3f"))
}

/// Frame `source` into `out_dir`, named after `now`.
pub fn export_framed(
    backend: &impl ImageBackend,
    source: &Path,
    out_dir: &Path,
    border_px: u32,
    now: DateTime<Local>,
) -> Result<FramedExport, FrameError> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(download_file_name(now));
    let dimensions = create_framed(backend, source, &path, border_px)?;
    Ok(FramedExport { path, dimensions })
}

/// Frame `source` to an explicit output path.
pub fn export_framed_to(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    border_px: u32,
) -> Result<FramedExport, FrameError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dimensions = create_framed(backend, source, output, border_px)?;
    Ok(FramedExport {
        path: output.to_path_buf(),
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{DEFAULT_FRAME_BORDER, RustBackend};
    use crate::test_helpers::{jpeg_bytes, write_file};
    use chrono::TimeZone;

    fn at(ms: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, 9, 8, 7)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(ms as i64))
            .unwrap()
    }

    #[test]
    fn file_name_is_local_timestamp_with_millis() {
        assert_eq!(download_file_name(at(42)), "20240501090807042.jpg");
        assert_eq!(download_file_name(at(999)), "20240501090807999.jpg");
    }

    #[test]
    fn export_names_output_by_time() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let out = tmp.path().join("downloads");

        let export = export_framed(&backend, Path::new("/src/a.jpg"), &out, 96, at(5)).unwrap();
        assert_eq!(export.path, out.join("20240501090807005.jpg"));
        assert_eq!(export.dimensions, Dimensions { width: 1792, height: 1392 });
        assert!(out.is_dir());
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Frame {
                source: "/src/a.jpg".into(),
                output: export.path.to_string_lossy().to_string(),
                border_px: 96,
            }]
        );
    }

    #[test]
    fn backend_failure_propagates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::failing_on(&["a.jpg"]);
        let err = export_framed(&backend, Path::new("/src/a.jpg"), tmp.path(), 96, at(0)).unwrap_err();
        assert!(matches!(err, FrameError::Backend(_)));
    }

    #[test]
    fn real_export_grows_by_border() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = write_file(tmp.path(), "a.jpg", &jpeg_bytes(300, 200, [30, 90, 160]));
        let output = tmp.path().join("out/framed.jpg");
        let export = export_framed_to(&RustBackend::new(), &source, &output, DEFAULT_FRAME_BORDER).unwrap();
        assert_eq!(export.dimensions, Dimensions { width: 492, height: 392 });
        assert_eq!(image::image_dimensions(&output).unwrap(), (492, 392));
    }
}
