//! Skip-list for the built-in thumbnail generator.
//!
//! Watch mode resyncs after every saved file, so regenerating every
//! thumbnail each time would make it unusable on a real library. The
//! thumbnails directory therefore carries a small JSON index recording,
//! for each thumbnail it holds, which source bytes and which settings
//! produced it.
//!
//! A [`ThumbKey`] pairs two SHA-256 digests: one over the source file
//! bytes, one over `(max_size, quality)`. Modification times are not
//! used; a fresh clone or `git checkout` keeps every thumbnail valid.
//! Since lookups go by key rather than by path, marking a photo as
//! featured (which renames its thumbnail) is served by copying the old
//! file.
//!
//! The index lives at `<source>/thumbnails/.cache-manifest.json` and is
//! never mirrored into the site.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the index inside the thumbnails directory.
pub const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Format revision; an index with any other value is discarded.
const FORMAT_VERSION: u32 = 1;

/// What produced a thumbnail: digests of the source and of the settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ThumbKey {
    pub source: String,
    pub params: String,
}

impl ThumbKey {
    pub fn new(source: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            params: params.into(),
        }
    }
}

/// Thumbnail path (relative to the thumbnails directory) to its key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ThumbIndex {
    version: u32,
    entries: BTreeMap<String, ThumbKey>,
    #[serde(skip)]
    by_key: HashMap<ThumbKey, String>,
    #[serde(skip)]
    changed: bool,
}

impl Default for ThumbIndex {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: BTreeMap::new(),
            by_key: HashMap::new(),
            changed: false,
        }
    }
}

impl ThumbIndex {
    /// Read the index from `thumbs_dir`. Anything unreadable starts over
    /// with an empty one.
    pub fn load(thumbs_dir: &Path) -> Self {
        let parsed = std::fs::read(manifest_path(thumbs_dir))
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Self>(&bytes).ok())
            .filter(|cache| cache.version == FORMAT_VERSION);
        match parsed {
            Some(mut cache) => {
                cache.reindex();
                cache
            }
            None => Self::default(),
        }
    }

    /// Write the index back if it changed since [`load`](Self::load).
    pub fn save_if_dirty(&mut self, thumbs_dir: &Path) -> io::Result<bool> {
        if !self.changed {
            return Ok(false);
        }
        std::fs::create_dir_all(thumbs_dir)?;
        std::fs::write(manifest_path(thumbs_dir), serde_json::to_vec_pretty(self)?)?;
        self.changed = false;
        Ok(true)
    }

    /// Stored thumbnail for `key`, if its file is still on disk.
    ///
    /// The returned path can differ from the one the caller wants to write;
    /// copying it over is still cheaper than a decode.
    pub fn lookup(&self, key: &ThumbKey, thumbs_dir: &Path) -> Option<&str> {
        let stored = self.by_key.get(key)?;
        thumbs_dir.join(stored).is_file().then_some(stored.as_str())
    }

    /// Record that `thumb_path` was produced from `key`. A previous path
    /// holding the same key is forgotten.
    pub fn record(&mut self, thumb_path: &str, key: ThumbKey) {
        if let Some(previous) = self.by_key.get(&key) {
            if previous != thumb_path {
                self.entries.remove(previous);
                self.changed = true;
            }
        }
        if self.entries.get(thumb_path) != Some(&key) {
            self.changed = true;
            if let Some(replaced) = self.entries.insert(thumb_path.to_string(), key.clone()) {
                self.by_key.remove(&replaced);
            }
        }
        self.by_key.insert(key, thumb_path.to_string());
    }

    /// Forget every path not in `live`.
    pub fn retain(&mut self, live: &HashSet<String>) {
        let before = self.entries.len();
        self.entries.retain(|path, _| live.contains(path));
        if self.entries.len() != before {
            self.changed = true;
            self.reindex();
        }
    }

    /// Thumbnail paths currently recorded.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindex(&mut self) {
        self.by_key = self
            .entries
            .iter()
            .map(|(path, key)| (key.clone(), path.clone()))
            .collect();
    }
}

/// Hex SHA-256 of a file's bytes.
pub fn source_digest(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Hex SHA-256 of the settings that shape a thumbnail.
pub fn params_digest(max_size: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(max_size.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Where `thumbs_dir` keeps its index.
pub fn manifest_path(thumbs_dir: &Path) -> PathBuf {
    thumbs_dir.join(MANIFEST_FILENAME)
}

/// How each thumbnail of a run was obtained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} generated", self.misses);
        }
        write!(f, "{} cached, ", self.hits)?;
        if self.copies > 0 {
            write!(f, "{} copied, ", self.copies)?;
        }
        write!(f, "{} generated ({} total)", self.misses, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn key(source: &str) -> ThumbKey {
        ThumbKey::new(source, "p")
    }

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "thumb").unwrap();
    }

    // =========================================================================
    // Lookup and record
    // =========================================================================

    #[test]
    fn new_cache_is_clean_and_empty() {
        let mut cache = ThumbIndex::default();
        assert!(cache.is_empty());
        let tmp = TempDir::new().unwrap();
        assert!(!cache.save_if_dirty(tmp.path()).unwrap());
        assert!(!manifest_path(tmp.path()).exists());
    }

    #[test]
    fn recorded_thumbnail_is_found_by_key() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ThumbIndex::default();
        cache.record("trips/b.jpg", key("s1"));
        touch(tmp.path(), "trips/b.jpg");

        assert_eq!(cache.lookup(&key("s1"), tmp.path()), Some("trips/b.jpg"));
        assert_eq!(cache.lookup(&key("s2"), tmp.path()), None);
    }

    #[test]
    fn different_settings_do_not_match() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ThumbIndex::default();
        cache.record("a.jpg", ThumbKey::new("s", "720/85"));
        touch(tmp.path(), "a.jpg");
        assert_eq!(cache.lookup(&ThumbKey::new("s", "720/90"), tmp.path()), None);
    }

    #[test]
    fn missing_file_is_not_a_hit() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ThumbIndex::default();
        cache.record("gone.jpg", key("s"));
        assert_eq!(cache.lookup(&key("s"), tmp.path()), None);
    }

    #[test]
    fn renamed_source_moves_the_entry() {
        let mut cache = ThumbIndex::default();
        cache.record("a.jpg", key("s"));
        cache.record("!a.jpg", key("s"));
        assert_eq!(cache.paths().collect::<Vec<_>>(), vec!["!a.jpg"]);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    #[test]
    fn index_survives_a_reload() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        let mut cache = ThumbIndex::default();
        cache.record("a.jpg", key("s"));
        assert!(cache.save_if_dirty(tmp.path()).unwrap());

        let reloaded = ThumbIndex::load(tmp.path());
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.lookup(&key("s"), tmp.path()), Some("a.jpg"));
    }

    #[test]
    fn re_recording_same_entry_does_not_rewrite() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ThumbIndex::default();
        cache.record("a.jpg", key("s"));
        cache.save_if_dirty(tmp.path()).unwrap();

        let mut reloaded = ThumbIndex::load(tmp.path());
        reloaded.record("a.jpg", key("s"));
        assert!(!reloaded.save_if_dirty(tmp.path()).unwrap());
    }

    #[test]
    fn unreadable_index_starts_over() {
        let tmp = TempDir::new().unwrap();
        fs::write(manifest_path(tmp.path()), "{not json").unwrap();
        assert!(ThumbIndex::load(tmp.path()).is_empty());

        fs::write(manifest_path(tmp.path()), r#"{"version":999,"entries":{}}"#).unwrap();
        assert!(ThumbIndex::load(tmp.path()).is_empty());
    }

    #[test]
    fn retain_drops_dead_paths() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "drop.jpg");
        let mut cache = ThumbIndex::default();
        cache.record("keep.jpg", key("s1"));
        cache.record("drop.jpg", key("s2"));
        cache.save_if_dirty(tmp.path()).unwrap();

        let live: HashSet<String> = ["keep.jpg".to_string()].into_iter().collect();
        cache.retain(&live);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&key("s2"), tmp.path()), None);
        assert!(cache.save_if_dirty(tmp.path()).unwrap());
    }

    // =========================================================================
    // Digests and stats
    // =========================================================================

    #[test]
    fn source_digest_follows_bytes_not_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a"), "same").unwrap();
        fs::write(tmp.path().join("b"), "same").unwrap();
        fs::write(tmp.path().join("c"), "different").unwrap();
        let a = source_digest(&tmp.path().join("a")).unwrap();
        assert_eq!(a, source_digest(&tmp.path().join("b")).unwrap());
        assert_ne!(a, source_digest(&tmp.path().join("c")).unwrap());
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn params_digest_tracks_size_and_quality() {
        let base = params_digest(720, 85);
        assert_ne!(base, params_digest(1024, 85));
        assert_ne!(base, params_digest(720, 90));
        assert_eq!(base, params_digest(720, 85));
    }

    #[test]
    fn stats_summary_line() {
        let mut stats = CacheStats::default();
        stats.miss();
        assert_eq!(stats.to_string(), "1 generated");
        stats.hit();
        stats.hit();
        assert_eq!(stats.to_string(), "2 cached, 1 generated (3 total)");
        stats.copy();
        assert_eq!(stats.to_string(), "2 cached, 1 copied, 1 generated (4 total)");
    }
}
