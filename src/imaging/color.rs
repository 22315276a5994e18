//! Readable ink for captions drawn over a photo.
//!
//! Gallery tiles print their date label in the bottom-left corner. The label
//! colour depends on how bright that corner is: the patch covering the left
//! 22% of the width and the bottom 22% of the height is scaled to 48x48, and
//! its mean relative luminance decides between dark and light ink.
//!
//! Luminance uses the sRGB transfer curve and BT.709 weights:
//!
//! ```text
//! lin(c) = c/12.92                 if c <= 0.04045
//!          ((c + 0.055)/1.055)^2.4 otherwise
//! Y      = 0.2126 R + 0.7152 G + 0.0722 B
//! ```

use image::DynamicImage;
use image::imageops::FilterType;
use std::fmt;

/// Fraction of each dimension covered by the sampled corner patch.
const PATCH_FRACTION: f64 = 0.22;
const SAMPLE_SIZE: u32 = 48;
/// Pixels more transparent than this are ignored.
const MIN_ALPHA: u8 = 16;
/// Mean luminance assumed when no pixel qualifies.
const EMPTY_SAMPLE_LUMINANCE: f64 = 0.3;
/// Above this mean luminance the corner counts as bright.
const BRIGHT_THRESHOLD: f64 = 0.5;

/// A CSS `rgba()` colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Caption colour plus the text shadow that keeps it legible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub color: Rgba,
    pub shadow: Rgba,
}

impl Ink {
    /// Near-black ink for bright backgrounds.
    pub const DARK: Ink = Ink {
        color: Rgba { r: 17, g: 17, b: 17, a: 0.82 },
        shadow: Rgba { r: 255, g: 255, b: 255, a: 0.42 },
    };

    /// White ink for dark backgrounds; also the fallback.
    pub const LIGHT: Ink = Ink {
        color: Rgba { r: 255, g: 255, b: 255, a: 0.92 },
        shadow: Rgba { r: 0, g: 0, b: 0, a: 0.38 },
    };
}

fn srgb_to_linear(c: u8) -> f64 {
    let v = c as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance of an 8-bit sRGB colour, in `0.0..=1.0`.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * srgb_to_linear(r) + 0.7152 * srgb_to_linear(g) + 0.0722 * srgb_to_linear(b)
}

/// Mean luminance of the bottom-left patch.
pub fn bottom_left_luminance(img: &DynamicImage) -> f64 {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return EMPTY_SAMPLE_LUMINANCE;
    }
    let y = h.saturating_sub((h as f64 * PATCH_FRACTION).floor() as u32);
    let patch_w = ((w as f64 * PATCH_FRACTION).floor() as u32).max(1);
    let patch_h = (h - y).max(1);
    let y = y.min(h - patch_h);

    let patch = img.crop_imm(0, y, patch_w, patch_h);
    let sample = patch.resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle).to_rgba8();

    let (sum, count) = sample
        .pixels()
        .filter(|p| p[3] >= MIN_ALPHA)
        .fold((0.0, 0u32), |(sum, count), p| {
            (sum + relative_luminance(p[0], p[1], p[2]), count + 1)
        });
    if count == 0 {
        EMPTY_SAMPLE_LUMINANCE
    } else {
        sum / count as f64
    }
}

/// Pick caption ink for a photo's bottom-left corner.
pub fn pick_readable_ink(img: &DynamicImage) -> Ink {
    if bottom_left_luminance(img) > BRIGHT_THRESHOLD {
        Ink::DARK
    } else {
        Ink::LIGHT
    }
}
