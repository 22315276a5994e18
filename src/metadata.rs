//! Photo metadata: from raw EXIF values to the manifest's `date` and `fields`.
//!
//! ## Capture date
//!
//! The earliest of the three EXIF dates wins:
//!
//! ```text
//! DateTimeOriginal (+ OffsetTimeOriginal) ─┐
//! CreateDate                               ├─ earliest ─→ "2024-05-01T10:20:30+08:00"
//! ModifyDate                               ┘
//!                 none of them  ─→  file modification time (UTC), if enabled
//! ```
//!
//! Camera clocks rarely carry a zone, so dates are compared as local wall-clock
//! times. The offset is only attached when `DateTimeOriginal` wins and an
//! offset was recorded.
//!
//! ## Fields
//!
//! Shown in the viewer's dock in this order, each only when present:
//!
//! | Label        | Example      |
//! |--------------|--------------|
//! | Camera       | `FUJIFILM X100V` |
//! | Lens         | `23mm f/2`   |
//! | Aperture     | `f/2.8`      |
//! | Shutter      | `1/250s`     |
//! | Focal length | `23mm`       |
//! | ISO          | `200`        |

use crate::imaging::ExifData;
use crate::manifest::MetaField;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use std::time::SystemTime;

pub const LABEL_CAMERA: &str = "Camera";
pub const LABEL_LENS: &str = "Lens";
pub const LABEL_APERTURE: &str = "Aperture";
pub const LABEL_SHUTTER: &str = "Shutter";
pub const LABEL_FOCAL_LENGTH: &str = "Focal length";
pub const LABEL_ISO: &str = "ISO";

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const ISO_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Date and display fields for one photo, as written to the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoMetadata {
    pub date: Option<String>,
    pub fields: Vec<MetaField>,
}

/// Summarize EXIF into manifest metadata.
///
/// `modified` is consulted only when no EXIF date is usable.
pub fn summarize(exif: &ExifData, modified: Option<SystemTime>) -> PhotoMetadata {
    let date = capture_date(exif).or_else(|| modified.map(file_time_date));
    PhotoMetadata {
        date,
        fields: display_fields(exif),
    }
}

/// The earliest EXIF date as ISO-8601, or `None` when no date parses.
pub fn capture_date(exif: &ExifData) -> Option<String> {
    let original = exif.date_time_original.as_deref().and_then(parse_exif_date);
    let others = [exif.create_date.as_deref(), exif.modify_date.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(parse_exif_date)
        .min();

    match (original, others) {
        (Some(o), Some(other)) if other < o => Some(other.format(ISO_LOCAL_FORMAT).to_string()),
        (Some(o), _) => Some(with_offset(o, exif.offset_time_original.as_deref())),
        (None, Some(other)) => Some(other.format(ISO_LOCAL_FORMAT).to_string()),
        (None, None) => None,
    }
}

/// `YYYY:MM:DD HH:MM:SS`. All-zero placeholders do not parse.
fn parse_exif_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    // Some cameras write fractional seconds or a trailing zone; keep the first 19 chars.
    let head = raw.get(..19).unwrap_or(raw);
    NaiveDateTime::parse_from_str(head, EXIF_DATE_FORMAT).ok()
}

fn with_offset(local: NaiveDateTime, offset: Option<&str>) -> String {
    let zoned = offset
        .and_then(|o| o.trim().parse::<FixedOffset>().ok())
        .and_then(|tz| local.and_local_timezone(tz).single());
    match zoned {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, false),
        None => local.format(ISO_LOCAL_FORMAT).to_string(),
    }
}

/// A file time as an ISO-8601 UTC timestamp.
pub fn file_time_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Labelled display values in dock order.
pub fn display_fields(exif: &ExifData) -> Vec<MetaField> {
    let mut fields = Vec::new();
    if let Some(camera) = format_camera(exif.make.as_deref(), exif.model.as_deref()) {
        fields.push(MetaField::new(LABEL_CAMERA, camera));
    }
    if let Some(lens) = &exif.lens_model {
        fields.push(MetaField::new(LABEL_LENS, lens.clone()));
    }
    if let Some(f) = exif.f_number.filter(|f| f.is_finite() && *f > 0.0) {
        fields.push(MetaField::new(LABEL_APERTURE, format!("f/{f}")));
    }
    if let Some(shutter) = exif.exposure_time.and_then(format_exposure_time) {
        fields.push(MetaField::new(LABEL_SHUTTER, shutter));
    }
    if let Some(mm) = exif.focal_length.filter(|f| f.is_finite() && *f > 0.0) {
        fields.push(MetaField::new(LABEL_FOCAL_LENGTH, format!("{}mm", mm.round())));
    }
    if let Some(iso) = exif.iso {
        fields.push(MetaField::new(LABEL_ISO, iso.to_string()));
    }
    fields
}

/// Camera label: the model alone when it already names the make.
///
/// - `("Canon", "Canon EOS R5")` → `"Canon EOS R5"`
/// - `("FUJIFILM", "X100V")` → `"FUJIFILM X100V"`
pub fn format_camera(make: Option<&str>, model: Option<&str>) -> Option<String> {
    match (make, model) {
        (Some(make), Some(model)) => {
            if model.to_lowercase().starts_with(&make.to_lowercase()) {
                Some(model.to_string())
            } else {
                Some(format!("{make} {model}"))
            }
        }
        (None, Some(model)) => Some(model.to_string()),
        (Some(make), None) => Some(make.to_string()),
        (None, None) => None,
    }
}

/// Human shutter speed.
///
/// - `>= 1s`: one decimal below two seconds, none above (`1.4s`, `4s`)
/// - `< 1s`: reciprocal fraction (`1/250s`)
/// - non-finite or non-positive: `None`
pub fn format_exposure_time(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        let decimals = if seconds < 2.0 { 1 } else { 0 };
        return Some(format!("{seconds:.decimals$}s"));
    }
    Some(format!("1/{}s", (1.0 / seconds).round()))
}

// =============================================================================
// Display formatting for the viewer
// =============================================================================

fn parse_iso_date(iso: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(iso, ISO_LOCAL_FORMAT).ok()
}

/// Date-only label for gallery tiles, e.g. `2024-05-01`.
pub fn format_date_label(iso: &str) -> Option<String> {
    parse_iso_date(iso).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Date-and-time label for the viewer's dock, e.g. `2024-05-01 10:20`.
pub fn format_date_time_label(iso: &str) -> Option<String> {
    parse_iso_date(iso).map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn exif_with_dates(original: Option<&str>, create: Option<&str>, modify: Option<&str>) -> ExifData {
        ExifData {
            date_time_original: original.map(String::from),
            create_date: create.map(String::from),
            modify_date: modify.map(String::from),
            ..ExifData::default()
        }
    }

    // =========================================================================
    // Exposure formatting
    // =========================================================================

    #[test]
    fn exposure_fractions() {
        assert_eq!(format_exposure_time(0.5).as_deref(), Some("1/2s"));
        assert_eq!(format_exposure_time(1.0 / 250.0).as_deref(), Some("1/250s"));
        assert_eq!(format_exposure_time(0.3).as_deref(), Some("1/3s"));
    }

    #[test]
    fn exposure_seconds() {
        assert_eq!(format_exposure_time(1.4).as_deref(), Some("1.4s"));
        assert_eq!(format_exposure_time(4.0).as_deref(), Some("4s"));
        assert_eq!(format_exposure_time(1.0).as_deref(), Some("1.0s"));
        assert_eq!(format_exposure_time(30.0).as_deref(), Some("30s"));
    }

    #[test]
    fn exposure_invalid_values_omitted() {
        assert_eq!(format_exposure_time(0.0), None);
        assert_eq!(format_exposure_time(-1.0), None);
        assert_eq!(format_exposure_time(f64::NAN), None);
        assert_eq!(format_exposure_time(f64::INFINITY), None);
    }

    // =========================================================================
    // Camera / fields
    // =========================================================================

    #[test]
    fn camera_does_not_repeat_make() {
        assert_eq!(
            format_camera(Some("Canon"), Some("Canon EOS R5")).as_deref(),
            Some("Canon EOS R5")
        );
        assert_eq!(
            format_camera(Some("FUJIFILM"), Some("X100V")).as_deref(),
            Some("FUJIFILM X100V")
        );
        assert_eq!(format_camera(None, Some("X100V")).as_deref(), Some("X100V"));
        assert_eq!(format_camera(None, None), None);
    }

    #[test]
    fn fields_in_dock_order() {
        let exif = ExifData {
            make: Some("FUJIFILM".into()),
            model: Some("X100V".into()),
            lens_model: Some("23mm f/2".into()),
            f_number: Some(2.8),
            exposure_time: Some(1.0 / 250.0),
            focal_length: Some(23.4),
            iso: Some(200),
            ..ExifData::default()
        };
        let fields = display_fields(&exif);
        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|f| (f.label.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Camera", "FUJIFILM X100V"),
                ("Lens", "23mm f/2"),
                ("Aperture", "f/2.8"),
                ("Shutter", "1/250s"),
                ("Focal length", "23mm"),
                ("ISO", "200"),
            ]
        );
    }

    #[test]
    fn whole_aperture_has_no_decimal() {
        let exif = ExifData {
            f_number: Some(4.0),
            ..ExifData::default()
        };
        assert_eq!(display_fields(&exif)[0].value, "f/4");
    }

    #[test]
    fn empty_exif_has_no_fields() {
        assert!(display_fields(&ExifData::default()).is_empty());
    }

    // =========================================================================
    // Capture date
    // =========================================================================

    #[test]
    fn earliest_date_wins() {
        let exif = exif_with_dates(
            Some("2024:05:01 10:20:30"),
            Some("2024:04:30 08:00:00"),
            Some("2024:06:01 00:00:00"),
        );
        assert_eq!(capture_date(&exif).as_deref(), Some("2024-04-30T08:00:00"));
    }

    #[test]
    fn original_date_carries_offset() {
        let mut exif = exif_with_dates(Some("2024:05:01 10:20:30"), None, Some("2024:05:02 00:00:00"));
        exif.offset_time_original = Some("+08:00".into());
        assert_eq!(
            capture_date(&exif).as_deref(),
            Some("2024-05-01T10:20:30+08:00")
        );
    }

    #[test]
    fn bad_offset_is_ignored() {
        let mut exif = exif_with_dates(Some("2024:05:01 10:20:30"), None, None);
        exif.offset_time_original = Some("garbage".into());
        assert_eq!(capture_date(&exif).as_deref(), Some("2024-05-01T10:20:30"));
    }

    #[test]
    fn zero_placeholder_dates_are_skipped() {
        let exif = exif_with_dates(Some("0000:00:00 00:00:00"), None, Some("2023:01:02 03:04:05"));
        assert_eq!(capture_date(&exif).as_deref(), Some("2023-01-02T03:04:05"));
    }

    #[test]
    fn falls_back_to_file_time() {
        let modified = UNIX_EPOCH + Duration::from_secs(1_714_558_830);
        let meta = summarize(&ExifData::default(), Some(modified));
        assert_eq!(meta.date.as_deref(), Some("2024-05-01T10:20:30Z"));
    }

    #[test]
    fn no_date_without_fallback() {
        let meta = summarize(&ExifData::default(), None);
        assert_eq!(meta, PhotoMetadata::default());
    }

    // =========================================================================
    // Display labels
    // =========================================================================

    #[test]
    fn date_labels() {
        assert_eq!(format_date_label("2024-05-01T10:20:30").as_deref(), Some("2024-05-01"));
        assert_eq!(
            format_date_time_label("2024-05-01T10:20:30+08:00").as_deref(),
            Some("2024-05-01 10:20")
        );
        assert_eq!(format_date_label("2024-05-01T10:20:30Z").as_deref(), Some("2024-05-01"));
        assert_eq!(format_date_label("yesterday"), None);
    }
}
