//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1 to 100, default 85). Clamped on construction.
//! - [`ThumbnailParams`]: source, output, exact target size, quality, matte colour.
//! - [`FrameParams`]: source, output, border, longest-side cap, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Colour transparent pixels are flattened onto (JPEG has no alpha).
pub const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Parameters for a thumbnail operation (aspect-preserving downscale).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Final dimensions, already fitted to the source aspect ratio.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub background: [u8; 3],
}

/// Parameters for a framed export.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Border thickness before the longest-side cap is applied.
    pub border_px: u32,
    pub max_side: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }
}
