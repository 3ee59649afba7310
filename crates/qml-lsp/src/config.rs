//! Environment-variable and settings-file build directory resolution.
//!
//! This is the binary's own concern: `qml-registry` only knows how to *use*
//! an environment fallback list and a settings lookup closure, not how to
//! find either one.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use qml_registry::SettingsLookup;

/// Environment variable carrying a `:`-separated list of build directories,
/// consulted when a file's root has no explicit `$/addBuildDirs` entry.
const BUILD_DIRS_ENV: &str = "QMLLS_BUILD_DIRS";

/// Name of the per-directory settings file searched for upward from a file.
const SETTINGS_FILE_NAME: &str = ".qmlls.ini";

/// Parse [`BUILD_DIRS_ENV`] into a path list, empty if unset.
pub fn env_fallback_dirs() -> Vec<PathBuf> {
    std::env::var(BUILD_DIRS_ENV)
        .ok()
        .map(|value| std::env::split_paths(&value).collect())
        .unwrap_or_default()
}

/// Build a [`SettingsLookup`] closure that searches upward from a file for
/// [`SETTINGS_FILE_NAME`], reading a single `buildDir = <path>` line (one
/// directory per settings file; relative paths resolve against the
/// settings file's own directory). Falls back to a user-scope config file
/// in the platform config directory when no per-directory `.qmlls.ini` is
/// found anywhere up the tree.
pub fn settings_lookup() -> SettingsLookup {
    Arc::new(|file: &Path| -> Option<Vec<PathBuf>> {
        let mut dir = file.parent();
        while let Some(candidate) = dir {
            let ini = candidate.join(SETTINGS_FILE_NAME);
            if ini.is_file() {
                if let Some(build_dir) = parse_build_dir(&ini) {
                    return Some(vec![build_dir]);
                }
            }
            dir = candidate.parent();
        }
        user_scope_ini().filter(|ini| ini.is_file()).and_then(|ini| parse_build_dir(&ini)).map(|dir| vec![dir])
    })
}

/// The user-scope settings file, outside any project tree: `<config
/// dir>/qmlls.ini`.
fn user_scope_ini() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_FILE_NAME.trim_start_matches('.')))
}

fn parse_build_dir(ini: &Path) -> Option<PathBuf> {
    let contents = fs::read_to_string(ini).ok()?;
    for line in contents.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else { continue };
        if key.trim() != "buildDir" {
            continue;
        }
        let value = value.trim();
        let path = PathBuf::from(value);
        return Some(if path.is_absolute() {
            path
        } else {
            ini.parent().map(|dir| dir.join(&path)).unwrap_or(path)
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn settings_lookup_finds_the_nearest_ini_upward() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join(SETTINGS_FILE_NAME), "buildDir = build\n").expect("write ini");
        let nested = root.path().join("src").join("ui");
        fs::create_dir_all(&nested).expect("mkdir");
        let file = nested.join("App.qml");
        fs::File::create(&file).expect("create").write_all(b"Item {}\n").expect("write");

        let lookup = settings_lookup();
        let dirs = lookup(&file).expect("found a settings file");
        assert_eq!(dirs, vec![root.path().join("build")]);
    }

    #[test]
    fn settings_lookup_returns_none_with_no_ini_in_the_tree() {
        let root = tempfile::tempdir().expect("tempdir");
        let file = root.path().join("App.qml");
        let lookup = settings_lookup();
        assert!(lookup(&file).is_none());
    }
}
