//! Root-URL registration and per-file build-directory resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A function that looks up the `buildDir` setting nearest to a given file
/// (an INI-style `.qmlls.ini` search, or a user-scope config fallback).
/// Supplied by the binary crate, which owns settings-file I/O; kept generic
/// here so this crate has no filesystem-format opinions.
pub type SettingsLookup = Arc<dyn Fn(&Path) -> Option<Vec<PathBuf>> + Send + Sync>;

/// Registered project roots and their explicit build directories, plus the
/// external fallbacks consulted when a file has none.
pub struct BuildDirRegistry {
    /// Root URLs the client reported via `workspace/didChangeWorkspaceFolders`.
    roots: RwLock<Vec<String>>,
    /// Per-root build directories set via the `$/addBuildDirs` extension.
    /// The empty string is the "no matching root" default.
    per_root: RwLock<FxHashMap<String, Vec<PathBuf>>>,
    /// Fallback directories parsed from the `QMLLS_BUILD_DIRS` environment
    /// variable.
    env_fallback: Vec<PathBuf>,
    /// Settings-file lookup, consulted after the environment variable.
    settings_lookup: Option<SettingsLookup>,
}

impl BuildDirRegistry {
    /// Create a registry with the given environment-variable fallback list
    /// and an optional settings-file lookup function.
    pub fn new(env_fallback: Vec<PathBuf>, settings_lookup: Option<SettingsLookup>) -> Self {
        Self {
            roots: RwLock::new(Vec::new()),
            per_root: RwLock::new(FxHashMap::default()),
            env_fallback,
            settings_lookup,
        }
    }

    /// Register a workspace root URL.
    pub fn add_root(&self, root_url: String) {
        let mut roots = self.roots.write();
        if !roots.contains(&root_url) {
            roots.push(root_url);
        }
    }

    /// Remove a previously registered root URL.
    pub fn remove_root(&self, root_url: &str) {
        self.roots.write().retain(|r| r != root_url);
        self.per_root.write().remove(root_url);
    }

    /// Apply the `$/addBuildDirs` extension payload: set explicit
    /// build directories for one root URL.
    pub fn set_build_dirs(&self, root_url: String, build_dirs: Vec<PathBuf>) {
        self.per_root.write().insert(root_url, build_dirs);
    }

    /// The longest registered root URL that is a prefix of `file_url`, if
    /// any.
    pub fn root_for(&self, file_url: &str) -> Option<String> {
        self.roots
            .read()
            .iter()
            .filter(|root| file_url.starts_with(root.as_str()))
            .max_by_key(|root| root.len())
            .cloned()
    }

    /// Resolve the build directories to search for `file_path` (the
    /// canonical path corresponding to `file_url`), following a fixed
    /// fallback order:
    ///
    /// (a) explicit per-root directories, if the file's root has any;
    /// (b) the empty-root default, if registered;
    /// (c) the `QMLLS_BUILD_DIRS` environment variable;
    /// (d) the nearest `.qmlls.ini`/user-scope settings value;
    /// (e) a heuristic upward search for a `build*` directory, taking the
    ///     most recently modified match at the first ancestor where one is
    ///     found;
    ///
    /// augmented, finally, by one level of each resolved directory's
    /// immediate subdirectories, where generated dependency sources tend
    /// to land.
    pub fn build_paths_for_file(&self, file_url: &str, file_path: &Path) -> Vec<PathBuf> {
        let mut dirs = if let Some(root) = self.root_for(file_url) {
            self.per_root.read().get(&root).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };

        if dirs.is_empty() {
            if let Some(default) = self.per_root.read().get("") {
                dirs = default.clone();
            }
        }

        if dirs.is_empty() && !self.env_fallback.is_empty() {
            dirs = self.env_fallback.clone();
        }

        if dirs.is_empty() {
            if let Some(lookup) = &self.settings_lookup {
                if let Some(found) = lookup(file_path) {
                    dirs = found;
                }
            }
        }

        if dirs.is_empty() {
            dirs = heuristic_search(file_path);
        }

        let mut augmented = dirs.clone();
        for dir in &dirs {
            if let Ok(entries) = std::fs::read_dir(dir) {
                for entry in entries.flatten() {
                    if entry.path().is_dir() {
                        augmented.push(entry.path());
                    }
                }
            }
        }
        augmented
    }
}

/// Walk upward from `file_path`'s directory looking for entries whose name
/// starts with `build`; at the first ancestor with any matches, return the
/// most recently modified one.
fn heuristic_search(file_path: &Path) -> Vec<PathBuf> {
    let mut dir = file_path.parent().map(Path::to_path_buf);
    while let Some(current) = dir {
        let mut candidates: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&current) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("build") && entry.path().is_dir() {
                    let modified = entry
                        .metadata()
                        .and_then(|m| m.modified())
                        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                    candidates.push((entry.path(), modified));
                }
            }
        }
        if let Some((best, _)) = candidates.into_iter().max_by_key(|(_, t)| *t) {
            return vec![best];
        }
        dir = current.parent().map(Path::to_path_buf);
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_per_root_wins_over_env_fallback() {
        let registry = BuildDirRegistry::new(vec![PathBuf::from("/env/build")], None);
        registry.add_root("file:///proj/".to_string());
        registry.set_build_dirs("file:///proj/".to_string(), vec![PathBuf::from("/proj/build")]);
        let dirs = registry.build_paths_for_file("file:///proj/src/A.qml", Path::new("/proj/src/A.qml"));
        assert!(dirs.contains(&PathBuf::from("/proj/build")));
        assert!(!dirs.contains(&PathBuf::from("/env/build")));
    }

    #[test]
    fn falls_back_to_env_var_when_no_root_registered() {
        let registry = BuildDirRegistry::new(vec![PathBuf::from("/env/build")], None);
        let dirs = registry.build_paths_for_file("file:///other/A.qml", Path::new("/other/A.qml"));
        assert_eq!(dirs, vec![PathBuf::from("/env/build")]);
    }
}
