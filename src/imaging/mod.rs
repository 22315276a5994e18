//! Image processing: pure Rust on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **EXIF metadata** | custom parser (JPEG APP1, TIFF, PNG `eXIf`, WebP `EXIF`) |
//! | **Thumbnail** | Lanczos3 downscale, alpha flattened, JPEG |
//! | **Framed export** | blurred cover matte + veil, JPEG |
//! | **Caption ink** | bottom-left luminance sample |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod color;
pub mod exif_parser;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{FrameLayout, calculate_fill_dimensions, fit_within, frame_layout};
pub use color::{Ink, pick_readable_ink};
pub use exif_parser::ExifData;
pub use operations::{
    DEFAULT_FRAME_BORDER, ThumbnailConfig, create_framed, create_thumbnail, plan_thumbnail,
};
pub use params::{FrameParams, Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
