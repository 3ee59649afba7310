//! Deduplicated directory worklist.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// A directory queued for enumeration, with a remaining recursion budget.
#[derive(Clone, Debug)]
pub struct WorklistEntry {
    /// The directory to scan.
    pub path: PathBuf,
    /// How many more levels of subdirectories to descend into after this
    /// one.
    pub depth_remaining: u32,
}

/// The indexer's pending-directory queue. New entries are rejected if a
/// previously queued directory is already an ancestor (longest-prefix
/// dedup), since scanning it will visit the new path anyway.
#[derive(Default)]
pub struct Worklist {
    entries: VecDeque<WorklistEntry>,
    queued_paths: Vec<PathBuf>,
}

impl Worklist {
    /// An empty worklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `paths` at `depth_remaining`, skipping any that are already
    /// covered by a queued ancestor.
    pub fn add_directories(&mut self, paths: &[PathBuf], depth_remaining: u32) {
        for path in paths {
            if self.is_covered(path) {
                continue;
            }
            self.queued_paths.retain(|existing| !existing.starts_with(path) || existing == path);
            self.queued_paths.push(path.clone());
            self.entries.push_back(WorklistEntry { path: path.clone(), depth_remaining });
        }
    }

    fn is_covered(&self, path: &Path) -> bool {
        self.queued_paths.iter().any(|existing| path.starts_with(existing))
    }

    /// Pop the next directory to scan.
    pub fn pop(&mut self) -> Option<WorklistEntry> {
        self.entries.pop_front()
    }

    /// Number of directories still queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the worklist has no queued directories.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpath_of_queued_directory_is_not_added_again() {
        let mut worklist = Worklist::new();
        worklist.add_directories(&[PathBuf::from("/proj")], 8);
        worklist.add_directories(&[PathBuf::from("/proj/src")], 8);
        assert_eq!(worklist.len(), 1);
    }

    #[test]
    fn unrelated_directory_is_queued_independently() {
        let mut worklist = Worklist::new();
        worklist.add_directories(&[PathBuf::from("/proj/a")], 8);
        worklist.add_directories(&[PathBuf::from("/proj/b")], 8);
        assert_eq!(worklist.len(), 2);
    }
}
