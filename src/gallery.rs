//! Gallery view state: tiles, lazy thumbnail loading, and the render cache.
//!
//! ## Tile lifecycle
//!
//! ```text
//! Pending ──near viewport──▶ Loading ──decoded──▶ Ready
//!                               │
//!                               └──fetch/decode failed──▶ Removed
//! ```
//!
//! A tile starts loading only when its rect intersects the viewport grown by
//! one viewport height on every side. `Ready` and `Removed` are terminal; a
//! tile is never processed twice.
//!
//! ## Render cache
//!
//! Leaving the gallery keeps the built view and its scroll offset in
//! [`GalleryCache`]. Coming back shows the cached view at once, then
//! [`GalleryCache::revalidate`] compares a fresh catalog against the cached
//! key (ordered ids joined with `|`) and rebuilds only when it differs.

use crate::catalog::Photo;
use crate::geometry::{Rect, Viewport};
use crate::imaging::{Ink, pick_readable_ink};
use crate::metadata::format_date_label;
use crate::router::photo_href;
use image::DynamicImage;

/// Shown when the catalog is empty.
pub const EMPTY_TITLE: &str = "No photos found.";
pub const EMPTY_HINT: &str = "Put photos into images/ and refresh the page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Pending,
    Loading,
    Ready,
    Removed,
}

/// One gallery tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub photo: Photo,
    pub href: String,
    /// Date-only label from the manifest date.
    pub date_label: Option<String>,
    pub state: TileState,
    /// Object URL the tile displays once ready.
    pub object_url: Option<String>,
    /// Caption ink, sampled from the decoded thumbnail.
    pub ink: Option<Ink>,
}

impl Tile {
    fn new(photo: Photo) -> Self {
        Self {
            href: photo_href(&photo.id),
            date_label: photo.date.as_deref().and_then(format_date_label),
            photo,
            state: TileState::Pending,
            object_url: None,
            ink: None,
        }
    }
}

/// A thumbnail the shell should fetch for a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub index: usize,
    /// Thumbnail URL, or the original when the manifest had no thumbnail.
    pub url: String,
}

/// Key identifying a gallery's content: ordered ids joined with `|`.
pub fn gallery_key(photos: &[Photo]) -> String {
    photos.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join("|")
}

/// Area around the viewport in which tiles start loading.
pub fn prefetch_area(viewport: Viewport) -> Rect {
    viewport.rect().expanded(viewport.height, viewport.height)
}

/// A built gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    key: String,
    tiles: Vec<Tile>,
}

impl GalleryView {
    pub fn build(photos: Vec<Photo>) -> Self {
        Self {
            key: gallery_key(&photos),
            tiles: photos.into_iter().map(Tile::new).collect(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Whether to render the "no photos found" state.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn index_of(&self, photo_id: &str) -> Option<usize> {
        self.tiles.iter().position(|t| t.photo.id == photo_id)
    }

    /// Tiles still shown (everything but `Removed`).
    pub fn visible_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.state != TileState::Removed)
    }

    /// A tile's rect is known. Starts loading when it is a pending tile
    /// inside the prefetch area.
    pub fn on_tile_rect(&mut self, index: usize, rect: Rect, viewport: Viewport) -> Option<LoadRequest> {
        let tile = self.tiles.get_mut(index)?;
        if tile.state != TileState::Pending || !rect.intersects(&prefetch_area(viewport)) {
            return None;
        }
        tile.state = TileState::Loading;
        Some(LoadRequest {
            index,
            url: tile.photo.tile_source().to_string(),
        })
    }

    /// The thumbnail for a loading tile decoded.
    pub fn on_thumbnail_loaded(&mut self, index: usize, object_url: String, decoded: &DynamicImage) {
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.state == TileState::Loading {
                tile.ink = Some(pick_readable_ink(decoded));
                tile.object_url = Some(object_url);
                tile.state = TileState::Ready;
            }
        }
    }

    /// Fetching or decoding the thumbnail failed: drop the tile.
    pub fn on_thumbnail_failed(&mut self, index: usize) {
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.state == TileState::Loading {
                tile.state = TileState::Removed;
            }
        }
    }
}

/// Outcome of revalidating the cached gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidation {
    Unchanged,
    Rebuilt,
}

/// The one retained gallery view, plus the scroll offset to restore.
#[derive(Debug, Default)]
pub struct GalleryCache {
    view: Option<GalleryView>,
    scroll_y: f64,
}

impl GalleryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached view and its scroll offset, for immediate redisplay.
    pub fn enter(&mut self) -> Option<(&mut GalleryView, f64)> {
        let scroll_y = self.scroll_y;
        self.view.as_mut().map(|v| (v, scroll_y))
    }

    pub fn view(&self) -> Option<&GalleryView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut GalleryView> {
        self.view.as_mut()
    }

    pub fn store(&mut self, view: GalleryView) {
        self.view = Some(view);
    }

    pub fn save_scroll(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y;
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Compare a fresh catalog against the cached view. An unchanged id
    /// sequence keeps the cached view verbatim (tile states included).
    pub fn revalidate(&mut self, fresh: Vec<Photo>) -> Revalidation {
        let key = gallery_key(&fresh);
        if self.view.as_ref().is_some_and(|view| view.key == key) {
            return Revalidation::Unchanged;
        }
        self.view = Some(GalleryView::build(fresh));
        Revalidation::Rebuilt
    }

    pub fn invalidate(&mut self) {
        self.view = None;
    }
}
