//! Object URLs for fetched thumbnails.
//!
//! The viewer never re-downloads a thumbnail within a session: the first
//! fetch registers the bytes under an object URL (`blob:mosaic/<n>`) and later
//! requests for the same source URL get the same object URL back. Object URLs
//! stay alive until revoked; [`ThumbnailCache::clear`] revokes every one it
//! created.

use crate::fetch::{FetchError, Fetcher};
use std::collections::HashMap;
use std::rc::Rc;

const BLOB_PREFIX: &str = "blob:mosaic/";

/// Live object URLs and the bytes behind them.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    next: u64,
    live: HashMap<String, Rc<[u8]>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh object URL.
    pub fn create(&mut self, bytes: Vec<u8>) -> String {
        self.next += 1;
        let url = format!("{BLOB_PREFIX}{}", self.next);
        self.live.insert(url.clone(), Rc::from(bytes));
        url
    }

    /// Bytes behind a live object URL.
    pub fn resolve(&self, url: &str) -> Option<Rc<[u8]>> {
        self.live.get(url).cloned()
    }

    /// Returns whether the URL was live.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.live.remove(url).is_some()
    }

    pub fn is_blob_url(url: &str) -> bool {
        url.starts_with(BLOB_PREFIX)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// Source URL → object URL, for the whole session.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    registry: BlobRegistry,
    by_source: HashMap<String, String>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object URL for `source_url`, fetching it on first use.
    ///
    /// Failures are not cached; the next call fetches again.
    pub fn get_or_fetch(&mut self, fetcher: &impl Fetcher, source_url: &str) -> Result<String, FetchError> {
        if let Some(url) = self.by_source.get(source_url) {
            return Ok(url.clone());
        }
        let bytes = fetcher.fetch(source_url)?;
        let url = self.registry.create(bytes);
        self.by_source.insert(source_url.to_string(), url.clone());
        Ok(url)
    }

    /// Cached object URL without fetching.
    pub fn get(&self, source_url: &str) -> Option<&str> {
        self.by_source.get(source_url).map(String::as_str)
    }

    pub fn bytes(&self, object_url: &str) -> Option<Rc<[u8]>> {
        self.registry.resolve(object_url)
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    /// Revoke every object URL and forget them. Returns how many were revoked.
    pub fn clear(&mut self) -> usize {
        let mut revoked = 0;
        for (_, url) in self.by_source.drain() {
            if self.registry.revoke(&url) {
                revoked += 1;
            }
        }
        revoked
    }

    pub fn live_object_urls(&self) -> usize {
        self.registry.live_count()
    }
}
