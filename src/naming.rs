//! File-name conventions shared by the sync pipeline and the viewer.
//!
//! ## Featured Marker
//!
//! A file whose name starts with `!` is featured: its gallery tile spans two
//! columns. The marker is part of the file on disk (and of its URL and id) but
//! never of the name shown to visitors:
//! - `!sunset.jpg` → featured, display name "sunset.jpg"
//! - `sunset.jpg` → not featured, display name "sunset.jpg"
//!
//! ## Ordering
//!
//! Photos are ordered by display name with numeric-aware comparison, so
//! `img2.jpg` sorts before `img10.jpg`. See [`natural_cmp`].

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Prefix that marks a featured photo.
pub const FEATURED_MARKER: char = '!';

/// Result of parsing a photo file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    /// Whether the name carried the featured marker.
    pub featured: bool,
    /// File name with the marker stripped.
    pub display_name: String,
}

/// Parse the last segment of a relative path into featured flag and display name.
///
/// - `"!sunset.jpg"` → featured, "sunset.jpg"
/// - `"trips/!a.png"` → featured, "a.png"
/// - `"b.png"` → not featured, "b.png"
pub fn parse_file_name(rel_path: &str) -> ParsedFileName {
    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    match file_name.strip_prefix(FEATURED_MARKER) {
        Some(rest) => ParsedFileName {
            featured: true,
            display_name: rest.to_string(),
        },
        None => ParsedFileName {
            featured: false,
            display_name: file_name.to_string(),
        },
    }
}

/// Numeric-aware, case-insensitive string ordering.
///
/// Runs of ASCII digits compare by numeric value; everything else compares
/// case-insensitively. Names that are equal under those rules are ordered
/// lowercase-first, then by raw bytes, so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    compare_at(a, b, Level::Primary)
        .then_with(|| compare_at(a, b, Level::Case))
        .then_with(|| a.cmp(b))
}

#[derive(Clone, Copy)]
enum Level {
    Primary,
    Case,
}

fn compare_at(a: &str, b: &str, level: Level) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let ord = compare_digit_runs(&ln, &rn);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                let ord = match level {
                    Level::Primary => fold(l).cmp(&fold(r)),
                    Level::Case => l.is_uppercase().cmp(&r.is_uppercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two digit runs by value without parsing (runs may exceed u64).
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
