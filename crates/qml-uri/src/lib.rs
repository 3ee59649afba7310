//! Document URL ↔ filesystem path conversion and a bidirectional cache.
//!
//! URLs are opaque byte strings from the client; paths are access handles.
//! Keeping them distinct — rather than normalizing the URL itself —
//! preserves the client's exact URL for echoing back in responses while
//! still giving the rest of the server plain filesystem paths to work with.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use url::Url;

/// Convert a `file://` URL to a filesystem path. Returns `None` for
/// non-`file` schemes or malformed URLs.
pub fn url_to_fs_path(url: &str) -> Option<PathBuf> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}

/// Convert a filesystem path to a `file://` URL.
pub fn fs_path_to_url<P: AsRef<Path>>(path: P) -> Result<String, String> {
    let path = path.as_ref();
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(|e| e.to_string())?.join(path)
    };
    Url::from_file_path(&abs)
        .map(|u| u.to_string())
        .map_err(|()| format!("cannot convert {} to a file:// URL", abs.display()))
}

/// Whether a cache lookup may return a previously computed answer, or must
/// recompute and refresh the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Return the cached value if present.
    Cached,
    /// Recompute unconditionally and overwrite the cache.
    Force,
}

/// Bidirectional URL↔path cache, keyed in both directions so repeated
/// conversions in either direction avoid re-parsing.
#[derive(Default)]
pub struct UrlPathCache {
    url_to_path: RwLock<FxHashMap<String, PathBuf>>,
    path_to_url: RwLock<FxHashMap<PathBuf, String>>,
}

impl UrlPathCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `url` to a canonical path, consulting/populating the cache
    /// per `mode`.
    pub fn url_to_path(&self, url: &str, mode: LookupMode) -> Option<PathBuf> {
        if mode == LookupMode::Cached {
            if let Some(path) = self.url_to_path.read().get(url) {
                return Some(path.clone());
            }
        }
        let path = url_to_fs_path(url)?;
        self.url_to_path.write().insert(url.to_string(), path.clone());
        self.path_to_url.write().insert(path.clone(), url.to_string());
        Some(path)
    }

    /// Resolve `path` to its URL, consulting/populating the cache per
    /// `mode`.
    pub fn path_to_url(&self, path: &Path, mode: LookupMode) -> Option<String> {
        if mode == LookupMode::Cached {
            if let Some(url) = self.path_to_url.read().get(path) {
                return Some(url.clone());
            }
        }
        let url = fs_path_to_url(path).ok()?;
        self.path_to_url.write().insert(path.to_path_buf(), url.clone());
        self.url_to_path.write().insert(url.clone(), path.to_path_buf());
        Some(url)
    }

    /// Drop any cached entries for `url`/its path (used when a document is
    /// closed and later reopened at a different canonical location).
    pub fn invalidate(&self, url: &str) {
        if let Some(path) = self.url_to_path.write().remove(url) {
            self.path_to_url.write().remove(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_cache() {
        let cache = UrlPathCache::new();
        let url = "file:///tmp/project/App.qml";
        let path = cache.url_to_path(url, LookupMode::Force).expect("valid file url");
        let back = cache.path_to_url(&path, LookupMode::Cached).expect("cached");
        assert_eq!(back, url);
    }

    #[test]
    fn non_file_scheme_returns_none() {
        assert!(url_to_fs_path("https://example.com/A.qml").is_none());
    }
}
