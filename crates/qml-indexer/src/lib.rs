//! Recursive workspace scanner: populates `current_env` with every file it
//! finds, and promotes structurally valid parses to `valid_env`.

#![warn(missing_docs)]

mod state;
mod worklist;

pub use state::IndexState;
pub use worklist::{Worklist, WorklistEntry};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use qml_environment::{Environment, LoadOptions, LoadSource};

/// Extensions the scanner treats as source files worth parsing.
const SOURCE_EXTENSIONS: &[&str] = &["qml"];

/// Directory names never descended into.
const SKIPPED_DIR_NAMES: &[&str] = &[".git", ".hg", ".svn", "node_modules", "target"];

/// Estimated relative cost of enumerating one queued directory, used only
/// for the progress fraction.
const DIR_COST: u64 = 4;

/// Upper bound on concurrently running scan workers. The reference design
/// runs exactly one.
const WORKER_BOUND: usize = 1;

struct IndexerInner {
    worklist: Mutex<Worklist>,
    done: AtomicU64,
    in_progress: AtomicU64,
    dir_errors: AtomicU64,
    workers: AtomicUsize,
    cancel: AtomicBool,
    current_env: Environment,
    valid_env: Environment,
    state: RwLock<IndexState>,
}

/// Background scanner shared between the LSP runtime and its worker tasks.
#[derive(Clone)]
pub struct Indexer {
    inner: Arc<IndexerInner>,
}

impl Indexer {
    /// Create a scanner writing into the given environments.
    pub fn new(current_env: Environment, valid_env: Environment) -> Self {
        Self {
            inner: Arc::new(IndexerInner {
                worklist: Mutex::new(Worklist::new()),
                done: AtomicU64::new(0),
                in_progress: AtomicU64::new(0),
                dir_errors: AtomicU64::new(0),
                workers: AtomicUsize::new(0),
                cancel: AtomicBool::new(false),
                current_env,
                valid_env,
                state: RwLock::new(IndexState::Idle),
            }),
        }
    }

    /// Queue directories for scanning.
    pub fn add_directories(&self, paths: &[PathBuf], max_depth: u32) {
        self.inner.worklist.lock().add_directories(paths, max_depth);
        self.refresh_state();
    }

    /// Current progress snapshot.
    pub fn state(&self) -> IndexState {
        self.inner.state.read().clone()
    }

    /// Request cancellation; in-flight units finish but no new ones start.
    pub fn cancel(&self) {
        self.inner.cancel.store(true, Ordering::SeqCst);
    }

    /// Spawn a worker if one is not already running and work remains. Safe
    /// to call repeatedly; a no-op once a worker is active or the worklist
    /// is empty.
    pub fn kick(&self) {
        if self.inner.worklist.lock().is_empty() {
            return;
        }
        if self.inner.workers.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            if n < WORKER_BOUND { Some(n + 1) } else { None }
        }).is_err() {
            return;
        }
        let indexer = self.clone();
        tokio::task::spawn_blocking(move || indexer.run_worker());
    }

    fn run_worker(&self) {
        loop {
            if self.inner.cancel.load(Ordering::SeqCst) {
                break;
            }
            let entry = {
                let mut worklist = self.inner.worklist.lock();
                worklist.pop()
            };
            let Some(entry) = entry else { break };
            self.scan_one(&entry.path, entry.depth_remaining);
            self.refresh_state();
        }
        self.inner.workers.fetch_sub(1, Ordering::SeqCst);
        self.refresh_state();
    }

    fn scan_one(&self, dir: &Path, depth_remaining: u32) {
        self.inner.in_progress.fetch_add(DIR_COST, Ordering::SeqCst);
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %dir.display(), %err, "skipping unreadable directory");
                self.inner.dir_errors.fetch_add(1, Ordering::SeqCst);
                self.inner.in_progress.fetch_sub(DIR_COST, Ordering::SeqCst);
                return;
            }
        };

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else { continue };
            if file_type.is_dir() {
                let name = entry.file_name();
                if !SKIPPED_DIR_NAMES.contains(&name.to_string_lossy().as_ref()) {
                    subdirs.push(path);
                }
            } else if file_type.is_file() && is_source_file(&path) {
                files.push(path);
            }
        }
        self.inner.in_progress.fetch_sub(DIR_COST, Ordering::SeqCst);

        if depth_remaining > 0 {
            self.inner.worklist.lock().add_directories(&subdirs, depth_remaining - 1);
        }

        for file in files {
            if self.inner.cancel.load(Ordering::SeqCst) {
                break;
            }
            self.index_file(&file);
        }
    }

    /// Parse one file into `current_env`, and promote to `valid_env` if it
    /// parsed without structural errors.
    fn index_file(&self, path: &Path) {
        self.inner.in_progress.fetch_add(1, Ordering::SeqCst);
        let mut staged = self.inner.current_env.stage_copy();
        let outcome = staged.load_file(path.to_path_buf(), LoadSource::Disk, LoadOptions::default());
        match outcome {
            Ok(tree) => {
                if let Err(err) = staged.load_pending_dependencies(&[]) {
                    tracing::warn!(path = %path.display(), %err, "dependency load failed");
                }
                let is_valid = tree.is_valid();
                self.inner.current_env.commit(staged);
                if is_valid {
                    let mut valid_staged = self.inner.current_env.stage_copy();
                    if valid_staged
                        .load_file(path.to_path_buf(), LoadSource::Disk, LoadOptions::default())
                        .is_ok()
                    {
                        self.inner.valid_env.commit(valid_staged);
                    }
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "parse failed, keeping prior entries");
            }
        }
        self.inner.done.fetch_add(1, Ordering::SeqCst);
        self.inner.in_progress.fetch_sub(1, Ordering::SeqCst);
    }

    fn refresh_state(&self) {
        let worklist = self.inner.worklist.lock();
        let queued = worklist.len() as u64 * DIR_COST;
        let in_progress = self.inner.in_progress.load(Ordering::SeqCst);
        let done = self.inner.done.load(Ordering::SeqCst);
        drop(worklist);

        let mut state = self.inner.state.write();
        *state = if queued == 0 && in_progress == 0 && self.inner.workers.load(Ordering::SeqCst) == 0
        {
            let errors = self.inner.dir_errors.load(Ordering::SeqCst);
            if errors > 0 {
                IndexState::Degraded { errors }
            } else if done > 0 {
                IndexState::Ready { file_count: done, completed_at: std::time::Instant::now() }
            } else {
                IndexState::Idle
            }
        } else {
            IndexState::Building { done, in_progress, queued }
        };
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn scans_directory_and_reaches_ready() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file_path = dir.path().join("Main.qml");
        std::fs::File::create(&file_path)
            .expect("create")
            .write_all(b"Item {\n}\n")
            .expect("write");

        let current = Environment::new();
        let valid = Environment::new();
        let indexer = Indexer::new(current.clone(), valid.clone());
        indexer.add_directories(&[dir.path().to_path_buf()], 8);
        indexer.kick();

        for _ in 0..200 {
            if indexer.state().is_ready() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(indexer.state().is_ready(), "indexer never reached Ready");
        assert!(current.get(&file_path).is_some());
        assert!(valid.get(&file_path).is_some());
    }

    #[test]
    fn progress_is_one_when_idle() {
        assert_eq!(IndexState::Idle.progress(), 0.0);
    }
}
