//! Byte sources for the viewer engine.
//!
//! The viewer requests everything by the same relative URLs a browser would
//! use (`./images-manifest.json`, `./images/!a.jpg`). A [`Fetcher`] resolves
//! them: [`SiteFetcher`] reads from a built site root on disk, and
//! [`MemoryFetcher`] serves a fixed set of responses.

use crate::paths::is_safe_relative_path;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Refusing to fetch unsafe URL: {0}")]
    Unsafe(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve a site-relative URL to bytes.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `./a/b` → `a/b`, validated.
fn site_path(url: &str) -> Result<&str, FetchError> {
    let rel = url.strip_prefix("./").unwrap_or(url);
    if is_safe_relative_path(rel) {
        Ok(rel)
    } else {
        Err(FetchError::Unsafe(url.to_string()))
    }
}

/// Serves files below a site root, the way a static host would.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    pub root: PathBuf,
}

impl SiteFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetcher for SiteFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let rel = site_path(url)?;
        std::fs::read(self.root.join(rel)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(url.to_string()),
            _ => FetchError::Io(e),
        })
    }
}

/// Fixed responses keyed by URL. Counts requests.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Cell<usize>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: serve `bytes` at `url`.
    pub fn with(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&mut self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.responses.insert(url.to_string(), bytes.into());
    }

    pub fn remove(&mut self, url: &str) {
        self.responses.remove(url);
    }

    /// Number of `fetch` calls so far.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.set(self.requests.get() + 1);
        site_path(url)?;
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
