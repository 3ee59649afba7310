//! Project-wide containers of parsed files.
//!
//! Two sibling [`Environment`]s are owned by the document/index coordinator:
//! `current_env` holds the latest parse of every known file, valid or not;
//! `valid_env` holds only the last known-good parse of each file. Files are
//! never written to an `Environment` directly — callers [`Environment::stage_copy`]
//! it, load/modify files in the returned [`StagedEnvironment`], and
//! [`Environment::commit`] the stage back, so concurrent readers of the base
//! never see a torn intermediate state.

#![warn(missing_docs)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use qml_dom::{parser, DomItem, FileTree};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Where a file's text comes from when loading it into a stage.
pub enum LoadSource<'a> {
    /// Read from disk.
    Disk,
    /// Use this in-memory text (an open document's current buffer).
    Memory(&'a str),
}

/// Parse options forwarded toward the (external, out-of-scope) type
/// resolver. The reference parser in `qml-dom` does not yet vary its
/// output on these — they are threaded through now so the real resolver can
/// consume them without an API break later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Parse embedded script expressions (JS blocks) in addition to the
    /// object tree.
    pub with_script_expressions: bool,
    /// Run semantic analysis (type binding, prototype chain resolution)
    /// after parsing.
    pub with_semantic_analysis: bool,
}

/// Errors raised while loading a file into a stage.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

#[derive(Default)]
struct EnvInner {
    files: FxHashMap<PathBuf, Arc<FileTree>>,
    reference_cache: FxHashMap<String, DomItem>,
}

/// A project-wide container of parsed files.
#[derive(Clone)]
pub struct Environment {
    inner: Arc<RwLock<EnvInner>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(EnvInner::default())) }
    }

    /// The parsed file at `path`, if loaded.
    pub fn get(&self, path: &Path) -> Option<Arc<FileTree>> {
        self.inner.read().files.get(path).cloned()
    }

    /// Number of files currently held.
    pub fn file_count(&self) -> usize {
        self.inner.read().files.len()
    }

    /// All currently loaded paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.read().files.keys().cloned().collect()
    }

    /// Begin a staged mutation: a handle that reads through to this
    /// environment's current files and collects new/updated files
    /// separately until committed.
    pub fn stage_copy(&self) -> StagedEnvironment {
        StagedEnvironment { base: self.clone(), staged: FxHashMap::default() }
    }

    /// Atomically merge a stage's files into this environment.
    pub fn commit(&self, staged: StagedEnvironment) {
        let mut inner = self.inner.write();
        for (path, tree) in staged.staged {
            inner.files.insert(path, tree);
        }
    }

    /// Drop a file (and its cached lookups) from this environment.
    pub fn remove_path(&self, path: &Path) {
        let mut inner = self.inner.write();
        inner.files.remove(path);
    }

    /// Invalidate memoized type lookups. Call after any commit that could
    /// change prototype resolution (e.g. a base class's properties
    /// changed).
    pub fn clear_reference_cache(&self) {
        self.inner.write().reference_cache.clear();
    }
}

/// A staged copy of an [`Environment`], accumulating new or updated files
/// before being committed back.
pub struct StagedEnvironment {
    base: Environment,
    staged: FxHashMap<PathBuf, Arc<FileTree>>,
}

impl StagedEnvironment {
    /// Parse a file and add it to the stage.
    pub fn load_file(
        &mut self,
        path: PathBuf,
        source: LoadSource<'_>,
        _options: LoadOptions,
    ) -> Result<Arc<FileTree>, EnvError> {
        let text = match source {
            LoadSource::Memory(text) => text.to_string(),
            LoadSource::Disk => std::fs::read_to_string(&path)
                .map_err(|source| EnvError::Io { path: path.clone(), source })?,
        };
        let outcome = parser::parse_source(&path, &text);
        self.staged.insert(path, Arc::clone(&outcome.tree));
        Ok(outcome.tree)
    }

    /// Look up a file either in the stage or, failing that, in the base
    /// environment this stage was created from.
    pub fn get(&self, path: &Path) -> Option<Arc<FileTree>> {
        self.staged.get(path).cloned().or_else(|| self.base.get(path))
    }

    /// Resolve `import` statements in every staged file transitively,
    /// loading their targets from disk if not already present in the stage
    /// or base.
    ///
    /// Each import is first tried relative to the importing file's own
    /// directory, then against each of `search_dirs` in order (the file's
    /// `build_paths_for_file` result, unioned with framework import
    /// locations). This is a deliberately simple resolver (no
    /// `qmldir`/module-path search); the full import graph is the type
    /// resolver's responsibility and out of scope here.
    pub fn load_pending_dependencies(&mut self, search_dirs: &[PathBuf]) -> Result<(), EnvError> {
        let mut seen: HashSet<PathBuf> = self.staged.keys().cloned().collect();
        let mut worklist: Vec<PathBuf> = self.staged.keys().cloned().collect();

        while let Some(path) = worklist.pop() {
            let Some(tree) = self.staged.get(&path).cloned() else { continue };
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let root = DomItem::root(tree);
            for child in root.children() {
                if child.kind() != qml_dom::NodeKind::Import {
                    continue;
                }
                let Some(module) = child.name() else { continue };
                let last_segment = module.rsplit('.').next().unwrap_or(module);
                let candidates =
                    std::iter::once(dir.clone()).chain(search_dirs.iter().cloned()).map(|base| {
                        base.join(format!("{last_segment}.qml"))
                    });
                for candidate in candidates {
                    if seen.contains(&candidate) || self.get(&candidate).is_some() {
                        continue;
                    }
                    if candidate.is_file()
                        && self
                            .load_file(candidate.clone(), LoadSource::Disk, LoadOptions::default())
                            .is_ok()
                    {
                        seen.insert(candidate.clone());
                        worklist.push(candidate);
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stage_commit_is_visible_only_after_commit() {
        let env = Environment::new();
        let mut staged = env.stage_copy();
        let path = PathBuf::from("A.qml");
        staged.load_file(path.clone(), LoadSource::Memory("Rectangle {\n}\n"), LoadOptions::default())
            .expect("parses");
        assert!(env.get(&path).is_none(), "not visible before commit");
        env.commit(staged);
        assert!(env.get(&path).is_some(), "visible after commit");
    }

    #[test]
    fn load_pending_dependencies_follows_imports() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base_path = dir.path().join("Base.qml");
        std::fs::File::create(&base_path)
            .expect("create")
            .write_all(b"Item {\n}\n")
            .expect("write");

        let env = Environment::new();
        let mut staged = env.stage_copy();
        let main_path = dir.path().join("Main.qml");
        staged
            .load_file(main_path.clone(), LoadSource::Memory("import Base\nItem {\n}\n"), LoadOptions::default())
            .expect("parses");
        staged.load_pending_dependencies(&[]).expect("resolves");
        assert!(staged.get(&base_path).is_some());
    }
}
