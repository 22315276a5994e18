//! # Mosaic Gal
//!
//! Tooling for a static masonry photo gallery. Photos live in a source
//! folder; a sync publishes them into a static site together with a JSON
//! manifest, and a single-page viewer reads that manifest at runtime.
//!
//! # Architecture: Two Halves Around One Manifest
//!
//! ```text
//! images/  ──sync──▶  public/images/ + public/images-manifest.json  ──fetch──▶  viewer
//!           (thumbnails, EXIF, mirror)                                (catalog, gallery, photo view)
//! ```
//!
//! The **sync** side runs on the author's machine: it generates thumbnails,
//! mirrors the source tree, reads EXIF and writes the manifest. Watch mode
//! re-runs it after every change.
//!
//! The **viewer engine** is everything the page decides, without a DOM: the
//! catalog read from the manifest, which gallery tiles load and when, fit
//! modes and pan in the photo view, crossfade timing, the open/close flight,
//! hash routing and the framed download. A shell (browser glue, or a test)
//! feeds it rects, decodes and clock readings and applies what it returns.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | One sync run: thumbnails, mirror, metadata, manifest |
//! | [`thumbnails`] | Built-in, external-command and disabled thumbnail generators |
//! | [`cache`] | Content-keyed thumbnail index (skips unchanged sources) |
//! | [`watch`] | Debounced file watching with a single-slot resync queue |
//! | [`scan`] | Image discovery in the source tree |
//! | [`manifest`] | `images-manifest.json` schema, strict writer and lenient reader |
//! | [`metadata`] | EXIF to manifest date and display fields |
//! | [`naming`] | Featured marker and numeric-aware file-name ordering |
//! | [`paths`] | Safe relative paths, photo ids, thumbnail paths, URLs |
//! | [`config`] | `gallery.toml` loading, layering and validation |
//! | [`imaging`] | Pure-Rust image operations: identify, EXIF, thumbnail, frame, ink |
//! | [`fetch`] | URL to bytes for the viewer engine (site directory or memory) |
//! | [`blobs`] | Object URLs for fetched thumbnails |
//! | [`catalog`] | Photo records as the viewer sees them |
//! | [`gallery`] | Tile state machine and the gallery render cache |
//! | [`geometry`] | Rects and viewport |
//! | [`viewer`] | Photo view: fit/pan, crossfade, dock |
//! | [`transition`] | Shared-element flight between tile and photo view |
//! | [`router`] | Hash routes and render tokens |
//! | [`app`] | Controller owning the viewer's long-lived state |
//! | [`frame`] | Framed export for downloads |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Manifest Is the Only Contract
//!
//! The viewer never lists directories. Everything it shows comes from the
//! manifest, and it reads the manifest leniently: unsafe paths and malformed
//! entries are dropped, and an unreadable manifest is an empty gallery. The
//! sync writes it strictly and only when its bytes change, so an idle watch
//! loop does not touch the site.
//!
//! ## Photo Ids Are Paths
//!
//! A photo's id is its percent-encoded relative path. Links survive
//! re-syncs and re-orderings, and [`catalog::PhotoCatalog::get_by_id`] can
//! rebuild a record without fetching anything. Every decoded id goes through
//! the same safe-path check as manifest entries.
//!
//! ## Time Is an Argument
//!
//! The viewer engine never sleeps or spawns. Crossfade deadlines and render
//! tokens are plain values, so tests drive the exact sequences a browser
//! produces, in order, without timers.
//!
//! ## Pure-Rust Imaging
//!
//! Thumbnails and framed exports use the `image` crate only. The binary has
//! no system dependencies; AVIF sources are published but not thumbnailed.

pub mod app;
pub mod blobs;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod frame;
pub mod gallery;
pub mod geometry;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod paths;
pub mod router;
pub mod scan;
pub mod sync;
pub mod thumbnails;
pub mod transition;
pub mod viewer;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
