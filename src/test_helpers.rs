//! Shared test utilities for the mosaic-gal test suite.
//!
//! Provides fixture writers (plain files, small real images, EXIF blocks) and
//! lookup helpers over manifest data.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_source_tree();
//! let exif = tiff_block(&[TiffTag::Ascii(TAG_MODEL, "X100V")], &[]);
//! write_file(tmp.path(), "images/c.jpg", &jpeg_with_exif(&exif));
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::manifest::{ImageDescriptor, Manifest};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `bytes` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Encode a solid-colour RGB JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Encode a solid-colour RGBA PNG of the given size.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Project root with `images/{!a.jpg, b.png, thumbnails/!a.jpg, thumbnails/b.jpg, .gitkeep}`.
pub fn setup_source_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_file(root, "images/.gitkeep", b"");
    write_file(root, "images/!a.jpg", &jpeg_bytes(16, 8, [200, 40, 40]));
    write_file(root, "images/b.png", &png_bytes(8, 16, [40, 40, 200, 255]));
    write_file(root, "images/thumbnails/!a.jpg", &jpeg_bytes(8, 4, [200, 40, 40]));
    write_file(root, "images/thumbnails/b.jpg", &jpeg_bytes(4, 8, [40, 40, 200]));
    tmp
}

// =========================================================================
// EXIF fixtures
// =========================================================================

pub const TAG_MAKE: u16 = 0x010F;
pub const TAG_MODEL: u16 = 0x0110;
pub const TAG_DATE_TIME: u16 = 0x0132;
pub const TAG_EXPOSURE_TIME: u16 = 0x829A;
pub const TAG_F_NUMBER: u16 = 0x829D;
pub const TAG_ISO: u16 = 0x8827;
pub const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const TAG_CREATE_DATE: u16 = 0x9004;
pub const TAG_OFFSET_TIME_ORIGINAL: u16 = 0x9011;
pub const TAG_FOCAL_LENGTH: u16 = 0x920A;
pub const TAG_LENS_MODEL: u16 = 0xA434;

/// A tag to place in a generated TIFF IFD.
pub enum TiffTag {
    Ascii(u16, &'static str),
    Rational(u16, u32, u32),
    Short(u16, u16),
}

/// Build a little-endian TIFF/EXIF block with IFD0 and an optional Exif sub-IFD.
pub fn tiff_block(ifd0: &[TiffTag], exif: &[TiffTag]) -> Vec<u8> {
    let n0 = ifd0.len() + usize::from(!exif.is_empty());
    let ifd0_size = 2 + 12 * n0 + 4;
    let exif_offset = 8 + ifd0_size;
    let exif_size = if exif.is_empty() { 0 } else { 2 + 12 * exif.len() + 4 };
    let data_base = exif_offset + exif_size;
    let mut data: Vec<u8> = Vec::new();

    let encode = |tag: &TiffTag, data: &mut Vec<u8>| -> Vec<u8> {
        let mut e = Vec::with_capacity(12);
        match tag {
            TiffTag::Ascii(id, s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                e.extend_from_slice(&id.to_le_bytes());
                e.extend_from_slice(&2u16.to_le_bytes());
                e.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                if bytes.len() <= 4 {
                    bytes.resize(4, 0);
                    e.extend_from_slice(&bytes);
                } else {
                    e.extend_from_slice(&((data_base + data.len()) as u32).to_le_bytes());
                    data.extend_from_slice(&bytes);
                    if data.len() % 2 == 1 {
                        data.push(0);
                    }
                }
            }
            TiffTag::Rational(id, num, den) => {
                e.extend_from_slice(&id.to_le_bytes());
                e.extend_from_slice(&5u16.to_le_bytes());
                e.extend_from_slice(&1u32.to_le_bytes());
                e.extend_from_slice(&((data_base + data.len()) as u32).to_le_bytes());
                data.extend_from_slice(&num.to_le_bytes());
                data.extend_from_slice(&den.to_le_bytes());
            }
            TiffTag::Short(id, v) => {
                e.extend_from_slice(&id.to_le_bytes());
                e.extend_from_slice(&3u16.to_le_bytes());
                e.extend_from_slice(&1u32.to_le_bytes());
                e.extend_from_slice(&v.to_le_bytes());
                e.extend_from_slice(&[0, 0]);
            }
        }
        e
    };

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    out.extend_from_slice(&(n0 as u16).to_le_bytes());
    for tag in ifd0 {
        out.extend(encode(tag, &mut data));
    }
    if !exif.is_empty() {
        out.extend_from_slice(&0x8769u16.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(exif_offset as u32).to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    if !exif.is_empty() {
        out.extend_from_slice(&(exif.len() as u16).to_le_bytes());
        for tag in exif {
            out.extend(encode(tag, &mut data));
        }
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    out.extend(data);
    out
}

/// Minimal JPEG stream carrying `tiff` in an APP1 Exif segment.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let len = (2 + 6 + tiff.len()) as u16;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

// =========================================================================
// Manifest lookups: panics with a clear message on miss
// =========================================================================

/// Find a descriptor by path. Panics if not found.
pub fn find_descriptor<'a>(manifest: &'a Manifest, path: &str) -> &'a ImageDescriptor {
    manifest
        .images
        .iter()
        .find(|d| d.path == path)
        .unwrap_or_else(|| {
            let paths: Vec<&str> = manifest.images.iter().map(|d| d.path.as_str()).collect();
            panic!("image '{path}' not found. Available: {paths:?}")
        })
}

/// Paths of all manifest entries, in manifest order.
pub fn manifest_paths(manifest: &Manifest) -> Vec<&str> {
    manifest.images.iter().map(|d| d.path.as_str()).collect()
}
