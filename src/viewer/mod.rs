//! Photo view: one photo on a stage, with fit modes, pan, a crossfade from
//! the tile's low-resolution image to the full image, and a dock with
//! metadata and a download button.
//!
//! The module is split into:
//! - **Fit**: fit modes, safe area, pan clamping ([`FitEngine`])
//! - **Crossfade**: timing of the low → full resolution swap ([`Crossfade`])
//! - **Dock**: metadata list and download button ([`MetaDock`], [`DownloadButton`])
//!
//! [`PhotoSession`] wires the three together for one open photo. Time comes
//! in as explicit `Instant`s; nothing here sleeps or spawns.

pub mod crossfade;
pub mod dock;
pub mod fit;

pub use crossfade::{Crossfade, CrossfadeAction, CrossfadePhase};
pub use dock::{DockMeta, DownloadButton, DownloadState, MetaDock};
pub use fit::{FitEngine, FitMode, SafeArea, StageGeometry, Transform, safe_area};

use crate::catalog::Photo;
use crate::frame::{FrameError, FramedExport, export_framed};
use crate::imaging::ImageBackend;
use crate::router::GALLERY_HASH;
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::Instant;

pub const NOT_FOUND_TITLE: &str = "Photo not found.";
pub const BACK_LABEL: &str = "Back to gallery";

/// What the photo route renders.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoScreen {
    NotFound,
    Open(Box<PhotoSession>),
}

impl PhotoScreen {
    /// Return link shown with the not-found state.
    pub fn back_href(&self) -> &'static str {
        GALLERY_HASH
    }

    pub fn session(&self) -> Option<&PhotoSession> {
        match self {
            PhotoScreen::Open(session) => Some(session),
            PhotoScreen::NotFound => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut PhotoSession> {
        match self {
            PhotoScreen::Open(session) => Some(session),
            PhotoScreen::NotFound => None,
        }
    }
}

/// One open photo.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSession {
    photo: Photo,
    low_source: Option<String>,
    fit: FitEngine,
    crossfade: Crossfade,
    dock: MetaDock,
    download: DownloadButton,
}

impl PhotoSession {
    /// Mount the view. `low_source` is shown until the full image fades in.
    pub fn open(photo: Photo, low_source: Option<String>, stage: StageGeometry, now: Instant) -> Self {
        let mut dock = MetaDock::new();
        dock.set_metadata(photo.date.as_deref(), &photo.fields);
        Self {
            photo,
            low_source,
            fit: FitEngine::new(stage),
            crossfade: Crossfade::mount(now),
            dock,
            download: DownloadButton::new(),
        }
    }

    pub fn photo(&self) -> &Photo {
        &self.photo
    }

    pub fn low_source(&self) -> Option<&str> {
        self.low_source.as_deref()
    }

    /// URL of the full-resolution layer.
    pub fn high_source(&self) -> &str {
        &self.photo.url
    }

    pub fn fit(&self) -> &FitEngine {
        &self.fit
    }

    pub fn crossfade(&self) -> &Crossfade {
        &self.crossfade
    }

    pub fn dock(&self) -> &MetaDock {
        &self.dock
    }

    pub fn download_button(&self) -> &DownloadButton {
        &self.download
    }

    pub fn transform(&self) -> Transform {
        self.fit.transform()
    }

    pub fn on_low_decoded(&mut self, width: u32, height: u32) -> Transform {
        self.fit.on_low_decoded(width, height)
    }

    pub fn on_high_decoded(&mut self, width: u32, height: u32, now: Instant) -> Transform {
        self.crossfade.on_high_loaded(now);
        self.dock.on_image_ready();
        self.fit.on_high_decoded(width, height)
    }

    pub fn on_fade_end(&mut self) -> Option<CrossfadeAction> {
        self.crossfade.on_fade_end()
    }

    /// Click on the stage: next fit mode.
    pub fn click(&mut self, now: Instant) -> Option<FitMode> {
        self.crossfade.on_interaction(now);
        self.fit.cycle()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, now: Instant) -> bool {
        let dragging = self.fit.begin_drag(x, y);
        if dragging {
            self.crossfade.on_interaction(now);
        }
        dragging
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<Transform> {
        self.fit.drag_to(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.fit.end_drag();
    }

    pub fn resize(&mut self, stage: StageGeometry) -> Transform {
        self.fit.relayout(stage, false)
    }

    /// Advance timers.
    pub fn tick(&mut self, now: Instant) -> Option<CrossfadeAction> {
        self.crossfade.poll(now)
    }

    /// Export a framed copy of `source` (the photo's file) into `out_dir`.
    ///
    /// `None` when an export is already running.
    pub fn download(
        &mut self,
        backend: &impl ImageBackend,
        source: &Path,
        out_dir: &Path,
        border_px: u32,
        now: DateTime<Local>,
    ) -> Option<Result<FramedExport, FrameError>> {
        self.download
            .run(|| export_framed(backend, source, out_dir, border_px, now))
    }
}
