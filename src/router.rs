//! Fragment routing.
//!
//! | Hash | Route |
//! |---|---|
//! | `""`, `#`, `#/` | gallery |
//! | `#/photo/<id>` | photo view for `<id>` (non-empty) |
//! | anything else | redirect to `#/` |
//!
//! Views render asynchronously in a browser, so a slow render for an old
//! hash must not overwrite the view for a newer one. Every navigation gets a
//! monotonically increasing [`RenderToken`]; only the latest token may commit.

/// Canonical gallery hash.
pub const GALLERY_HASH: &str = "#/";
const PHOTO_PREFIX: &str = "#/photo/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Gallery,
    Photo { id: String },
}

/// What to do with a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    /// Replace the location hash; the resulting navigation renders.
    Redirect(&'static str),
}

/// Map a location hash to a route.
pub fn resolve(hash: &str) -> Resolution {
    match hash {
        "" | "#" | GALLERY_HASH => Resolution::Render(Route::Gallery),
        _ => match hash.strip_prefix(PHOTO_PREFIX) {
            Some(id) if !id.is_empty() => Resolution::Render(Route::Photo { id: id.to_string() }),
            _ => Resolution::Redirect(GALLERY_HASH),
        },
    }
}

/// Link target for a photo id.
pub fn photo_href(id: &str) -> String {
    format!("{PHOTO_PREFIX}{id}")
}

/// Identifies one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderToken(u64);

/// A navigation in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub token: RenderToken,
    pub resolution: Resolution,
}

/// Issues render tokens and remembers the committed route.
#[derive(Debug, Default)]
pub struct Router {
    latest: u64,
    pending: Option<Route>,
    current: Option<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a navigation to `hash`. Any earlier navigation becomes stale.
    pub fn navigate(&mut self, hash: &str) -> Navigation {
        self.latest += 1;
        let resolution = resolve(hash);
        self.pending = match &resolution {
            Resolution::Render(route) => Some(route.clone()),
            Resolution::Redirect(_) => None,
        };
        Navigation {
            token: RenderToken(self.latest),
            resolution,
        }
    }

    pub fn is_current(&self, token: RenderToken) -> bool {
        token.0 == self.latest
    }

    /// Finish rendering for `token`. Returns the committed route, or `None`
    /// when the token is stale (or the navigation was a redirect).
    pub fn commit(&mut self, token: RenderToken) -> Option<&Route> {
        if !self.is_current(token) {
            return None;
        }
        let route = self.pending.take()?;
        self.current = Some(route);
        self.current.as_ref()
    }

    /// The last committed route.
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }
}
