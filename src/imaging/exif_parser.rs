//! Minimal EXIF reader for JPEG, TIFF, PNG and WebP files.
//!
//! Extracts the handful of tags the gallery shows:
//!
//! | IFD  | Tag    | Name               |
//! |------|--------|--------------------|
//! | 0    | 0x010F | Make               |
//! | 0    | 0x0110 | Model              |
//! | 0    | 0x0132 | DateTime (modify)  |
//! | Exif | 0x829A | ExposureTime       |
//! | Exif | 0x829D | FNumber            |
//! | Exif | 0x8827 | ISO                |
//! | Exif | 0x9003 | DateTimeOriginal   |
//! | Exif | 0x9004 | CreateDate         |
//! | Exif | 0x9011 | OffsetTimeOriginal |
//! | Exif | 0x920A | FocalLength        |
//! | Exif | 0xA434 | LensModel          |
//!
//! The TIFF structure is located by container:
//! - JPEG: APP1 segment starting with `Exif\0\0`
//! - TIFF: the file itself
//! - PNG: the `eXIf` chunk
//! - WebP: the RIFF `EXIF` chunk
//!
//! Every read is bounds-checked; a truncated or corrupt block yields whatever
//! tags were readable before the damage. AVIF/HEIF containers are not parsed.

use std::path::Path;

/// EXIF values relevant to the gallery. Strings are trimmed, never empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
    /// Raw `YYYY:MM:DD HH:MM:SS` strings as stored.
    pub date_time_original: Option<String>,
    pub create_date: Option<String>,
    pub modify_date: Option<String>,
    /// `+HH:MM` offset belonging to `date_time_original`.
    pub offset_time_original: Option<String>,
    /// Seconds.
    pub exposure_time: Option<f64>,
    pub f_number: Option<f64>,
    /// Millimetres.
    pub focal_length: Option<f64>,
    pub iso: Option<u32>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        *self == ExifData::default()
    }
}

/// Read EXIF from a file. I/O errors are returned; an unknown container or a
/// file without EXIF yields empty data.
pub fn read_exif(path: &Path) -> std::io::Result<ExifData> {
    let bytes = std::fs::read(path)?;
    Ok(parse_exif(&bytes))
}

/// Parse EXIF from in-memory file bytes, dispatching on magic bytes.
pub fn parse_exif(bytes: &[u8]) -> ExifData {
    let tiff = if bytes.starts_with(&[0xFF, 0xD8]) {
        find_jpeg_app1_exif(bytes)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(bytes)
    } else if bytes.starts_with(PNG_SIGNATURE) {
        find_png_exif(bytes)
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        find_webp_exif(bytes)
    } else {
        None
    };
    tiff.map(parse_tiff).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn strip_exif_header(data: &[u8]) -> &[u8] {
    data.strip_prefix(EXIF_HEADER).unwrap_or(data)
}

/// Find the TIFF block inside a JPEG's APP1 Exif segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS (0xDA): entropy-coded data follows, no more metadata
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if marker == 0xE1 && seg_start <= seg_end {
            let segment = &data[seg_start..seg_end];
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return Some(tiff);
            }
        }
        pos += 2 + seg_len;
    }
    None
}

/// Find the `eXIf` chunk of a PNG stream.
fn find_png_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let body_start = pos + 8;
        let body_end = body_start.checked_add(len)?;
        if body_end > data.len() {
            return None;
        }
        match kind {
            b"eXIf" => return Some(strip_exif_header(&data[body_start..body_end])),
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        // data + CRC
        pos = body_end + 4;
    }
    None
}

/// Find the `EXIF` chunk of a RIFF/WebP stream.
fn find_webp_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let kind = &data[pos..pos + 4];
        let len = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]) as usize;
        let body_start = pos + 8;
        let body_end = body_start.checked_add(len)?;
        if body_end > data.len() {
            return None;
        }
        if kind == b"EXIF" {
            return Some(strip_exif_header(&data[body_start..body_end]));
        }
        // Chunks are padded to even length
        pos = body_end + (len % 2);
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF IFD walk
// ---------------------------------------------------------------------------

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO: u16 = 0x8827;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_CREATE_DATE: u16 = 0x9004;
const TAG_OFFSET_TIME_ORIGINAL: u16 = 0x9011;
const TAG_FOCAL_LENGTH: u16 = 0x920A;
const TAG_LENS_MODEL: u16 = 0xA434;

/// Upper bound on entries per IFD; real files stay far below it.
const MAX_IFD_ENTRIES: usize = 1024;

struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    tag: u16,
    typ: u16,
    count: usize,
    /// Offset of the 4-byte value/offset field.
    field: usize,
}

impl<'a> Tiff<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };
        let tiff = Tiff { data, big_endian };
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset.checked_add(2)?)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset.checked_add(4)?)?;
        Some(if self.big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    }

    /// Entries of the IFD at `offset`; stops at the first entry that would
    /// run past the end of the block.
    fn entries(&self, offset: usize) -> Vec<Entry> {
        let Some(count) = self.u16_at(offset) else {
            return Vec::new();
        };
        let count = (count as usize).min(MAX_IFD_ENTRIES);
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = offset + 2 + i * 12;
            let (Some(tag), Some(typ), Some(n)) = (self.u16_at(at), self.u16_at(at + 2), self.u32_at(at + 4))
            else {
                break;
            };
            if at + 12 > self.data.len() {
                break;
            }
            entries.push(Entry {
                tag,
                typ,
                count: n as usize,
                field: at + 8,
            });
        }
        entries
    }

    /// Raw value bytes: inline when they fit the 4-byte field, else at the offset it holds.
    fn value_bytes(&self, entry: &Entry) -> Option<&'a [u8]> {
        let len = entry.count.checked_mul(type_size(entry.typ))?;
        let start = if len <= 4 {
            entry.field
        } else {
            self.u32_at(entry.field)? as usize
        };
        self.data.get(start..start.checked_add(len)?)
    }

    fn ascii(&self, entry: &Entry) -> Option<String> {
        if entry.typ != 2 && entry.typ != 7 {
            return None;
        }
        let raw = self.value_bytes(entry)?;
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn rational(&self, entry: &Entry) -> Option<f64> {
        let at = match entry.typ {
            5 | 10 => {
                if entry.count == 0 {
                    return None;
                }
                self.u32_at(entry.field)? as usize
            }
            _ => return self.unsigned(entry).map(f64::from),
        };
        let (num, den) = if entry.typ == 5 {
            (self.u32_at(at)? as f64, self.u32_at(at + 4)? as f64)
        } else {
            (self.u32_at(at)? as i32 as f64, self.u32_at(at + 4)? as i32 as f64)
        };
        if den == 0.0 {
            return None;
        }
        let value = num / den;
        value.is_finite().then_some(value)
    }

    fn unsigned(&self, entry: &Entry) -> Option<u32> {
        if entry.count == 0 {
            return None;
        }
        match entry.typ {
            3 => self.u16_at(entry.field).map(u32::from),
            4 => self.u32_at(entry.field),
            _ => None,
        }
    }
}

/// TIFF type sizes: count is number of values, not bytes.
fn type_size(typ: u16) -> usize {
    match typ {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 1,
    }
}

fn parse_tiff(data: &[u8]) -> ExifData {
    let Some(tiff) = Tiff::new(data) else {
        return ExifData::default();
    };
    let mut exif = ExifData::default();
    let Some(ifd0) = tiff.u32_at(4) else {
        return exif;
    };

    let mut exif_ifd = None;
    for entry in tiff.entries(ifd0 as usize) {
        match entry.tag {
            TAG_MAKE => exif.make = tiff.ascii(&entry),
            TAG_MODEL => exif.model = tiff.ascii(&entry),
            TAG_DATE_TIME => exif.modify_date = tiff.ascii(&entry),
            TAG_EXIF_IFD => exif_ifd = tiff.unsigned(&entry),
            _ => {}
        }
    }

    // A sub-IFD pointing back at IFD0 would only repeat it.
    if let Some(offset) = exif_ifd.filter(|&o| o != ifd0) {
        for entry in tiff.entries(offset as usize) {
            match entry.tag {
                TAG_EXPOSURE_TIME => exif.exposure_time = tiff.rational(&entry),
                TAG_F_NUMBER => exif.f_number = tiff.rational(&entry),
                TAG_ISO => exif.iso = tiff.unsigned(&entry),
                TAG_DATE_TIME_ORIGINAL => exif.date_time_original = tiff.ascii(&entry),
                TAG_CREATE_DATE => exif.create_date = tiff.ascii(&entry),
                TAG_OFFSET_TIME_ORIGINAL => exif.offset_time_original = tiff.ascii(&entry),
                TAG_FOCAL_LENGTH => exif.focal_length = tiff.rational(&entry),
                TAG_LENS_MODEL => exif.lens_model = tiff.ascii(&entry),
                _ => {}
            }
        }
    }

    exif
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TiffTag, jpeg_bytes, jpeg_with_exif, tiff_block};

    fn full_block() -> Vec<u8> {
        tiff_block(
            &[
                TiffTag::Ascii(TAG_MAKE, "FUJIFILM"),
                TiffTag::Ascii(TAG_MODEL, "X100V"),
                TiffTag::Ascii(TAG_DATE_TIME, "2024:05:02 09:00:00"),
            ],
            &[
                TiffTag::Rational(TAG_EXPOSURE_TIME, 1, 250),
                TiffTag::Rational(TAG_F_NUMBER, 28, 10),
                TiffTag::Short(TAG_ISO, 200),
                TiffTag::Ascii(TAG_DATE_TIME_ORIGINAL, "2024:05:01 10:20:30"),
                TiffTag::Ascii(TAG_OFFSET_TIME_ORIGINAL, "+08:00"),
                TiffTag::Rational(TAG_FOCAL_LENGTH, 230, 10),
                TiffTag::Ascii(TAG_LENS_MODEL, "23mm f/2"),
            ],
        )
    }

    #[test]
    fn reads_all_tags_from_tiff() {
        let exif = parse_exif(&full_block());
        assert_eq!(exif.make.as_deref(), Some("FUJIFILM"));
        assert_eq!(exif.model.as_deref(), Some("X100V"));
        assert_eq!(exif.modify_date.as_deref(), Some("2024:05:02 09:00:00"));
        assert_eq!(exif.date_time_original.as_deref(), Some("2024:05:01 10:20:30"));
        assert_eq!(exif.offset_time_original.as_deref(), Some("+08:00"));
        assert_eq!(exif.lens_model.as_deref(), Some("23mm f/2"));
        assert_eq!(exif.exposure_time, Some(1.0 / 250.0));
        assert_eq!(exif.f_number, Some(2.8));
        assert_eq!(exif.focal_length, Some(23.0));
        assert_eq!(exif.iso, Some(200));
        assert_eq!(exif.create_date, None);
    }

    #[test]
    fn reads_from_jpeg_app1() {
        let jpeg = jpeg_with_exif(&full_block());
        let exif = parse_exif(&jpeg);
        assert_eq!(exif.model.as_deref(), Some("X100V"));
        assert_eq!(exif.iso, Some(200));
    }

    #[test]
    fn reads_from_png_exif_chunk() {
        let tiff = full_block();
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&(tiff.len() as u32).to_be_bytes());
        png.extend_from_slice(b"eXIf");
        png.extend_from_slice(&tiff);
        png.extend_from_slice(&[0, 0, 0, 0]);
        let exif = parse_exif(&png);
        assert_eq!(exif.make.as_deref(), Some("FUJIFILM"));
    }

    #[test]
    fn reads_from_webp_exif_chunk() {
        let tiff = full_block();
        let mut body = b"WEBP".to_vec();
        body.extend_from_slice(b"EXIF");
        body.extend_from_slice(&((tiff.len() + 6) as u32).to_le_bytes());
        body.extend_from_slice(b"Exif\0\0");
        body.extend_from_slice(&tiff);
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&(body.len() as u32).to_le_bytes());
        webp.extend(body);
        let exif = parse_exif(&webp);
        assert_eq!(exif.lens_model.as_deref(), Some("23mm f/2"));
    }

    #[test]
    fn real_jpeg_without_exif_is_empty() {
        let exif = parse_exif(&jpeg_bytes(4, 4, [0, 0, 0]));
        assert!(exif.is_empty());
    }

    #[test]
    fn unknown_container_is_empty() {
        assert!(parse_exif(b"GIF89a....").is_empty());
        assert!(parse_exif(b"").is_empty());
    }

    #[test]
    fn truncated_block_does_not_panic() {
        let block = full_block();
        for cut in 0..block.len() {
            let _ = parse_exif(&block[..cut]);
            let _ = parse_exif(&jpeg_with_exif(&block[..cut]));
        }
    }

    #[test]
    fn zero_denominator_is_ignored() {
        let block = tiff_block(&[], &[TiffTag::Rational(TAG_F_NUMBER, 28, 0)]);
        assert_eq!(parse_exif(&block).f_number, None);
    }

    #[test]
    fn blank_strings_are_none() {
        let block = tiff_block(&[TiffTag::Ascii(TAG_MAKE, "   ")], &[]);
        assert_eq!(parse_exif(&block).make, None);
    }

    #[test]
    fn read_exif_missing_file_is_io_error() {
        assert!(read_exif(Path::new("/definitely/not/here.jpg")).is_err());
    }
}
