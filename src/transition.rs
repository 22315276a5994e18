//! Shared-element transition between a gallery tile and the photo view.
//!
//! Opening records where the tile was (rect, photo id, gallery scroll) and
//! flies a copy of the thumbnail from the tile to a centred target rect.
//! Closing swaps views first, restores the gallery scroll, then looks the
//! tile up again by photo id: it may have moved, or be gone, in which case
//! the overlay is simply removed.

use crate::geometry::{Rect, Viewport};
use std::time::Duration;

pub const FLIGHT_DURATION: Duration = Duration::from_millis(420);
pub const FLIGHT_EASING: &str = "cubic-bezier(0.2, 0.8, 0.2, 1)";

const TARGET_MIN_WIDTH: f64 = 240.0;
const TARGET_MAX_WIDTH: f64 = 980.0;
const TARGET_MIN_HEIGHT: f64 = 160.0;
const TARGET_MARGIN: f64 = 18.0;
const EMPTY_SOURCE_ASPECT: f64 = 0.75;

/// Centred rect the thumbnail flies to, keeping the source's aspect ratio.
pub fn target_rect_for_center(from: Rect, viewport: Viewport) -> Rect {
    let width = (viewport.width - 2.0 * TARGET_MARGIN).clamp(TARGET_MIN_WIDTH, TARGET_MAX_WIDTH);
    let aspect = if from.width > 0.0 {
        from.height / from.width
    } else {
        EMPTY_SOURCE_ASPECT
    };
    let height = (width * aspect).round().max(TARGET_MIN_HEIGHT);
    Rect::new(
        (viewport.width - width) / 2.0,
        TARGET_MARGIN.max((viewport.height - height) / 2.0),
        width,
        height,
    )
}

/// Translate and scale applied to the overlay, which sits at the `from` rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightTransform {
    pub dx: f64,
    pub dy: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl FlightTransform {
    pub const IDENTITY: FlightTransform = FlightTransform {
        dx: 0.0,
        dy: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn css(&self) -> String {
        format!(
            "translate({:.2}px, {:.2}px) scale({:.5}, {:.5})",
            self.dx, self.dy, self.scale_x, self.scale_y
        )
    }
}

/// An overlay animation between two rects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    pub from: Rect,
    pub to: Rect,
    pub duration: Duration,
}

impl Flight {
    pub fn new(from: Rect, to: Rect) -> Self {
        Self {
            from,
            to,
            duration: FLIGHT_DURATION,
        }
    }

    /// Transform at the end of the flight; the start is the identity.
    pub fn end_transform(&self) -> FlightTransform {
        let ratio = |to: f64, from: f64| if from > 0.0 { to / from } else { 1.0 };
        FlightTransform {
            dx: self.to.left - self.from.left,
            dy: self.to.top - self.from.top,
            scale_x: ratio(self.to.width, self.from.width),
            scale_y: ratio(self.to.height, self.from.height),
        }
    }
}

/// What the gallery looked like when a photo was opened.
#[derive(Debug, Clone, PartialEq)]
pub struct GallerySnapshot {
    pub photo_id: String,
    pub thumb_rect: Rect,
    pub scroll_y: f64,
}

/// Steps for the shell when closing the photo view, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseTransition {
    pub restore_scroll: Option<f64>,
    /// Overlay flight back to the tile; `None` removes the overlay at once.
    pub flight: Option<Flight>,
}

#[derive(Debug, Default)]
pub struct TransitionHelper {
    snapshot: Option<GallerySnapshot>,
}

impl TransitionHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&GallerySnapshot> {
        self.snapshot.as_ref()
    }

    /// Record the tile and start the flight to the centre.
    pub fn open(&mut self, photo_id: &str, thumb_rect: Rect, scroll_y: f64, viewport: Viewport) -> Flight {
        self.snapshot = Some(GallerySnapshot {
            photo_id: photo_id.to_string(),
            thumb_rect,
            scroll_y,
        });
        Flight::new(thumb_rect, target_rect_for_center(thumb_rect, viewport))
    }

    /// Fly from `photo_rect` back to the tile.
    ///
    /// `locate` runs after the gallery is back in place with its scroll
    /// restored and returns the tile's rect for a photo id, if it still has one.
    pub fn close(
        &mut self,
        photo_rect: Rect,
        locate: impl FnOnce(&str, f64) -> Option<Rect>,
    ) -> CloseTransition {
        let Some(snapshot) = self.snapshot.take() else {
            return CloseTransition {
                restore_scroll: None,
                flight: None,
            };
        };
        let flight = locate(&snapshot.photo_id, snapshot.scroll_y)
            .filter(|rect| !rect.is_empty())
            .map(|rect| Flight::new(photo_rect, rect));
        CloseTransition {
            restore_scroll: Some(snapshot.scroll_y),
            flight,
        }
    }
}
