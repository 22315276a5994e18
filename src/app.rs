//! The viewer's controller.
//!
//! [`AppContext`] owns every piece of state that outlives a single view:
//!
//! | State | Lifetime |
//! |---|---|
//! | thumbnail object URLs | until [`AppContext::clear_thumbnail_cache`] |
//! | gallery view + scroll | across photo visits |
//! | render tokens | per navigation |
//! | transition snapshot | from opening a photo to closing it |
//! | low-resolution hand-off | per photo id, for the session |
//!
//! The shell drives it: report the hash on every change, render whatever the
//! returned navigation asks for, and feed back tile rects, decodes and
//! pointer events.

use crate::blobs::ThumbnailCache;
use crate::catalog::{Photo, PhotoCatalog};
use crate::fetch::{FetchError, Fetcher};
use crate::gallery::{GalleryCache, GalleryView, Revalidation, TileState};
use crate::geometry::{Rect, Viewport};
use crate::router::{GALLERY_HASH, Navigation, RenderToken, Route, Router, photo_href};
use crate::transition::{CloseTransition, Flight, TransitionHelper};
use crate::viewer::{PhotoScreen, PhotoSession, StageGeometry};
use std::collections::HashMap;
use std::time::Instant;

/// Result of rendering the gallery route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalleryRender {
    /// Scroll offset to restore when the cached view was re-attached.
    pub restored_scroll: Option<f64>,
    /// Set when a cached view was revalidated against a fresh catalog.
    pub revalidation: Option<Revalidation>,
}

/// The shell should navigate to `hash` and run `flight` over the tile.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPhoto {
    pub hash: String,
    pub flight: Flight,
}

pub struct AppContext<F: Fetcher> {
    catalog: PhotoCatalog<F>,
    thumbnails: ThumbnailCache,
    gallery: GalleryCache,
    router: Router,
    transition: TransitionHelper,
    low_res: HashMap<String, String>,
    photo: Option<PhotoScreen>,
}

impl<F: Fetcher> AppContext<F> {
    pub fn new(catalog: PhotoCatalog<F>) -> Self {
        Self {
            catalog,
            thumbnails: ThumbnailCache::new(),
            gallery: GalleryCache::new(),
            router: Router::new(),
            transition: TransitionHelper::new(),
            low_res: HashMap::new(),
            photo: None,
        }
    }

    pub fn catalog(&self) -> &PhotoCatalog<F> {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PhotoCatalog<F> {
        &mut self.catalog
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn gallery(&self) -> Option<&GalleryView> {
        self.gallery.view()
    }

    pub fn photo(&self) -> Option<&PhotoScreen> {
        self.photo.as_ref()
    }

    pub fn photo_mut(&mut self) -> Option<&mut PhotoScreen> {
        self.photo.as_mut()
    }

    /// The location hash changed.
    pub fn navigate(&mut self, hash: &str) -> Navigation {
        self.router.navigate(hash)
    }

    /// Render the gallery for `token`. `None` when the token went stale.
    ///
    /// A cached view is re-attached first (scroll restored), then checked
    /// against a fresh catalog.
    pub fn render_gallery(&mut self, token: RenderToken) -> Option<GalleryRender> {
        if !self.router.is_current(token) {
            return None;
        }
        let photos = self.catalog.list_all();
        let render = if self.gallery.view().is_some() {
            GalleryRender {
                restored_scroll: Some(self.gallery.scroll_y()),
                revalidation: Some(self.gallery.revalidate(photos)),
            }
        } else {
            self.gallery.store(GalleryView::build(photos));
            GalleryRender {
                restored_scroll: None,
                revalidation: None,
            }
        };
        self.photo = None;
        self.router.commit(token)?;
        Some(render)
    }

    /// A tile's rect is known; load its thumbnail when it is near the
    /// viewport. Returns the tile's state afterwards.
    pub fn show_tile(&mut self, index: usize, rect: Rect, viewport: Viewport) -> Option<TileState> {
        let view = self.gallery.view_mut()?;
        if let Some(request) = view.on_tile_rect(index, rect, viewport) {
            match load_thumbnail(&mut self.thumbnails, self.catalog.fetcher(), &request.url) {
                Ok((object_url, decoded)) => view.on_thumbnail_loaded(index, object_url, &decoded),
                Err(_) => view.on_thumbnail_failed(index),
            }
        }
        view.tile(index).map(|t| t.state)
    }

    /// A tile was clicked. Hands the tile's image to the photo view, saves
    /// the gallery scroll and starts the opening flight.
    pub fn open_photo(&mut self, index: usize, tile_rect: Rect, scroll_y: f64, viewport: Viewport) -> Option<OpenPhoto> {
        let tile = self.gallery.view()?.tile(index)?;
        let id = tile.photo.id.clone();
        if let Some(url) = &tile.object_url {
            self.low_res.insert(id.clone(), url.clone());
        }
        self.gallery.save_scroll(scroll_y);
        let flight = self.transition.open(&id, tile_rect, scroll_y, viewport);
        Some(OpenPhoto {
            hash: photo_href(&id),
            flight,
        })
    }

    /// Render the photo route for `token`. `None` when the token went stale.
    pub fn render_photo(&mut self, token: RenderToken, id: &str, stage: StageGeometry, now: Instant) -> Option<&mut PhotoScreen> {
        if !self.router.is_current(token) {
            return None;
        }
        let screen = match self.catalog.find(id) {
            Some(photo) => {
                let low = self.low_resolution_source(&photo);
                PhotoScreen::Open(Box::new(PhotoSession::open(photo, low, stage, now)))
            }
            None => PhotoScreen::NotFound,
        };
        self.router.commit(token)?;
        self.photo = Some(screen);
        self.photo.as_mut()
    }

    /// Low-resolution layer: the clicked tile's image, else the thumbnail
    /// (or original) through the object-URL cache.
    fn low_resolution_source(&mut self, photo: &Photo) -> Option<String> {
        if let Some(url) = self.low_res.get(&photo.id) {
            if self.thumbnails.bytes(url).is_some() {
                return Some(url.clone());
            }
        }
        let url = self
            .thumbnails
            .get_or_fetch(self.catalog.fetcher(), photo.tile_source())
            .ok()?;
        self.low_res.insert(photo.id.clone(), url.clone());
        Some(url)
    }

    /// Leave the photo view. `locate` finds a tile's rect by photo id once
    /// the gallery is back and scrolled into place.
    pub fn close_photo(&mut self, photo_rect: Rect, locate: impl FnOnce(&str, f64) -> Option<Rect>) -> (String, CloseTransition) {
        self.photo = None;
        (GALLERY_HASH.to_string(), self.transition.close(photo_rect, locate))
    }

    /// The committed route.
    pub fn current_route(&self) -> Option<&Route> {
        self.router.current()
    }

    /// Revoke every thumbnail object URL. The hand-off map points at them
    /// too, so it goes as well. Returns how many URLs were revoked.
    pub fn clear_thumbnail_cache(&mut self) -> usize {
        self.low_res.clear();
        self.thumbnails.clear()
    }
}

fn load_thumbnail(
    thumbnails: &mut ThumbnailCache,
    fetcher: &impl Fetcher,
    url: &str,
) -> Result<(String, image::DynamicImage), FetchError> {
    let object_url = thumbnails.get_or_fetch(fetcher, url)?;
    let bytes = thumbnails
        .bytes(&object_url)
        .ok_or_else(|| FetchError::NotFound(object_url.clone()))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| FetchError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok((object_url, decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::router::Resolution;
    use crate::test_helpers::jpeg_bytes;

    const MANIFEST: &str = "./images-manifest.json";
    const VIEWPORT: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };
    const TILE: Rect = Rect {
        left: 0.0,
        top: 0.0,
        width: 200.0,
        height: 150.0,
    };

    fn stage() -> StageGeometry {
        StageGeometry::new(1036.0, 1036.0, 1036.0)
    }

    fn app(manifest: &str) -> AppContext<MemoryFetcher> {
        let fetcher = MemoryFetcher::new()
            .with(MANIFEST, manifest.as_bytes().to_vec())
            .with("./images/thumbnails/a.jpg", jpeg_bytes(8, 6, [250, 250, 250]))
            .with("./images/b.jpg", b"not an image".to_vec());
        AppContext::new(PhotoCatalog::new(fetcher, MANIFEST, "./images/"))
    }

    const TWO: &str = r#"{"images": [{"path": "a.jpg", "thumb": "thumbnails/a.jpg"}, "b.jpg"]}"#;

    fn show_gallery(app: &mut AppContext<MemoryFetcher>) -> GalleryRender {
        let nav = app.navigate("#/");
        app.render_gallery(nav.token).unwrap()
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    #[test]
    fn first_gallery_render_builds_view() {
        let mut app = app(TWO);
        let render = show_gallery(&mut app);
        assert_eq!(render.restored_scroll, None);
        assert_eq!(app.gallery().unwrap().key(), "a.jpg|b.jpg");
        assert_eq!(app.current_route(), Some(&Route::Gallery));
    }

    #[test]
    fn tiles_load_or_disappear() {
        let mut app = app(TWO);
        show_gallery(&mut app);
        assert_eq!(app.show_tile(0, TILE, VIEWPORT), Some(TileState::Ready));
        assert_eq!(app.show_tile(1, TILE, VIEWPORT), Some(TileState::Removed));
        assert_eq!(app.thumbnails().len(), 2);
    }

    #[test]
    fn stale_render_commits_nothing() {
        let mut app = app(TWO);
        let old = app.navigate("#/");
        let new = app.navigate("#/photo/a.jpg");
        assert!(app.render_gallery(old.token).is_none());
        assert!(app.gallery().is_none());
        assert!(app.render_photo(new.token, "a.jpg", stage(), Instant::now()).is_some());
    }

    #[test]
    fn unknown_hash_redirects() {
        let mut app = app(TWO);
        let nav = app.navigate("#/elsewhere");
        assert_eq!(nav.resolution, Resolution::Redirect("#/"));
    }

    // =========================================================================
    // Photo round trip
    // =========================================================================

    #[test]
    fn open_and_close_round_trip() {
        let mut app = app(TWO);
        show_gallery(&mut app);
        app.show_tile(0, TILE, VIEWPORT);
        let tile_url = app.gallery().unwrap().tiles()[0].object_url.clone();

        let open = app.open_photo(0, TILE, 480.0, VIEWPORT).unwrap();
        assert_eq!(open.hash, "#/photo/a.jpg");
        assert_eq!(open.flight.from, TILE);

        let nav = app.navigate(&open.hash);
        let Resolution::Render(Route::Photo { id }) = nav.resolution.clone() else {
            panic!("expected photo route");
        };
        let screen = app.render_photo(nav.token, &id, stage(), Instant::now()).unwrap();
        let session = screen.session().unwrap();
        assert_eq!(session.low_source().map(str::to_string), tile_url, "tile image handed off");

        let (hash, close) = app.close_photo(Rect::new(0.0, 0.0, 800.0, 600.0), |id, _| {
            assert_eq!(id, "a.jpg");
            Some(TILE)
        });
        assert_eq!(hash, "#/");
        assert_eq!(close.restore_scroll, Some(480.0));

        let render = show_gallery(&mut app);
        assert_eq!(render.restored_scroll, Some(480.0));
        assert_eq!(render.revalidation, Some(Revalidation::Unchanged));
        assert_eq!(app.gallery().unwrap().tiles()[0].state, TileState::Ready);
    }

    #[test]
    fn direct_photo_link_fetches_low_res() {
        let mut app = app(TWO);
        let nav = app.navigate("#/photo/a.jpg");
        let screen = app.render_photo(nav.token, "a.jpg", stage(), Instant::now()).unwrap();
        assert!(screen.session().unwrap().low_source().is_some());
    }

    #[test]
    fn unknown_photo_is_not_found() {
        let mut app = app(TWO);
        let nav = app.navigate("#/photo/zzz.jpg");
        let screen = app.render_photo(nav.token, "zzz.jpg", stage(), Instant::now()).unwrap();
        assert_eq!(*screen, PhotoScreen::NotFound);
    }

    #[test]
    fn catalog_change_rebuilds_gallery() {
        let mut app = app(TWO);
        show_gallery(&mut app);
        app.catalog_mut()
            .fetcher_mut()
            .insert(MANIFEST, br#"{"images": ["b.jpg"]}"#.to_vec());
        let render = show_gallery(&mut app);
        assert_eq!(render.revalidation, Some(Revalidation::Rebuilt));
        assert_eq!(app.gallery().unwrap().key(), "b.jpg");
    }

    #[test]
    fn clearing_cache_revokes_everything() {
        let mut app = app(TWO);
        show_gallery(&mut app);
        app.show_tile(0, TILE, VIEWPORT);
        app.open_photo(0, TILE, 0.0, VIEWPORT);
        assert_eq!(app.clear_thumbnail_cache(), 1);
        assert_eq!(app.thumbnails().live_object_urls(), 0);

        // The stale hand-off is not reused.
        let nav = app.navigate("#/photo/a.jpg");
        let screen = app.render_photo(nav.token, "a.jpg", stage(), Instant::now()).unwrap();
        let low = screen.session().unwrap().low_source().unwrap().to_string();
        assert!(app.thumbnails().bytes(&low).is_some());
    }
}
