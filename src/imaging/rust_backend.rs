//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF) | `image` crate (pure Rust decoders) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Alpha flattening | per-pixel blend onto a solid background |
//! | Matte blur | `image::imageops::blur` on a reduced copy |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | EXIF metadata | custom `exif_parser` (JPEG APP1, TIFF, PNG, WebP) |
//!
//! AVIF is not decodable with this feature set: AVIF sources are listed in the
//! manifest but get no built-in thumbnail.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{FrameLayout, calculate_fill_dimensions, frame_layout};
use super::exif_parser::{self, ExifData};
use super::params::{FLATTEN_BACKGROUND, FrameParams, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

/// Extensions whose decoders are compiled in.
const DECODABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Longest side of the working copy the matte is blurred at.
const MATTE_WORK_SIDE: u32 = 1024;

/// Matte veil: `rgba(244, 244, 244, 0.75)`.
const VEIL_COLOR: f32 = 244.0;
const VEIL_ALPHA: f32 = 0.75;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Drop the alpha channel by compositing onto `background`.
fn flatten_onto(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        image::Rgb([
            blend(p[0], background[0]),
            blend(p[1], background[1]),
            blend(p[2], background[2]),
        ])
    })
}

/// Encode as JPEG, creating parent directories.
fn save_jpeg(img: RgbImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

/// Blurred, veiled, cover-fitted copy of `picture` at canvas size.
fn render_matte(picture: &RgbImage, layout: &FrameLayout) -> RgbImage {
    let (cw, ch) = (layout.canvas_width, layout.canvas_height);
    let reduce = (cw.max(ch) as f32 / MATTE_WORK_SIDE as f32).max(1.0);
    let work_w = ((cw as f32 / reduce).round() as u32).max(1);
    let work_h = ((ch as f32 / reduce).round() as u32).max(1);

    let (fill_w, fill_h) = calculate_fill_dimensions(picture.dimensions(), (work_w, work_h));
    let cover = image::imageops::resize(picture, fill_w, fill_h, FilterType::Triangle);
    let x = (fill_w - work_w) / 2;
    let y = (fill_h - work_h) / 2;
    let cropped = image::imageops::crop_imm(&cover, x, y, work_w, work_h).to_image();
    let blurred = image::imageops::blur(&cropped, layout.blur_sigma / reduce);

    let mut matte = image::imageops::resize(&blurred, cw, ch, FilterType::Triangle);
    for pixel in matte.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = (*c as f32 * (1.0 - VEIL_ALPHA) + VEIL_COLOR * VEIL_ALPHA).round() as u8;
        }
    }
    matte
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_metadata(&self, path: &Path) -> Result<ExifData, BackendError> {
        Ok(exif_parser::read_exif(path)?)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let rgb = flatten_onto(&img, params.background);
        let sized = if rgb.dimensions() == (params.width, params.height) {
            rgb
        } else {
            image::imageops::resize(&rgb, params.width, params.height, FilterType::Lanczos3)
        };
        save_jpeg(sized, &params.output, params.quality.value())
    }

    fn frame(&self, params: &FrameParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let layout = frame_layout((img.width(), img.height()), params.border_px, params.max_side);

        let mut picture = flatten_onto(&img, FLATTEN_BACKGROUND);
        if picture.dimensions() != (layout.image_width, layout.image_height) {
            picture = image::imageops::resize(
                &picture,
                layout.image_width,
                layout.image_height,
                FilterType::Lanczos3,
            );
        }

        let mut canvas = if layout.border == 0 {
            picture.clone()
        } else {
            render_matte(&picture, &layout)
        };
        image::imageops::overlay(&mut canvas, &picture, layout.border as i64, layout.border as i64);

        save_jpeg(canvas, &params.output, params.quality.value())?;
        Ok(Dimensions {
            width: layout.canvas_width,
            height: layout.canvas_height,
        })
    }

    fn decodable_extensions(&self) -> &'static [&'static str] {
        DECODABLE_EXTENSIONS
    }
}
