//! Bounded-depth search for job configuration files in a directory tree.
//!
//! Behaves like `find <root> -mindepth N -maxdepth N -type f -name <file>`: only
//! regular files sitting exactly `depth` separators below the root are returned,
//! and directories that could only contain deeper entries are never descended.
//!
//! Relative paths are computed by stripping the root prefix from each visited
//! entry, so the walk never touches the process working directory and is safe to
//! run concurrently.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::WalkError;

/// Returns the paths, relative to `root`, of every regular file named `file_name`
/// whose relative path contains exactly `depth` separators.
///
/// Results are in depth-first order with siblings sorted by name. Any I/O failure
/// aborts the walk and discards what was found so far.
pub fn find_files(root: &Path, file_name: &str, depth: usize) -> Result<Vec<PathBuf>, WalkError> {
    info!(root = %root.display(), file_name, depth, "Searching for configuration files");

    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(WalkError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(WalkError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| within_bound(root, entry, depth));

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| WalkError::Traverse {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;

        // Gate on the entry type first: a directory may carry the target name too.
        if !entry.file_type().is_file() || entry.file_name() != file_name {
            continue;
        }
        let Some(rel) = relative(root, entry.path()) else {
            continue;
        };
        if separators(rel) == depth {
            debug!(path = %rel.display(), "Matched configuration file");
            found.push(rel.to_path_buf());
        }
    }

    info!(root = %root.display(), matches = found.len(), "Configuration search finished");
    Ok(found)
}

/// Keeps files, the root itself, and directories shallower than `depth`.
fn within_bound(root: &Path, entry: &DirEntry, depth: usize) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    match relative(root, entry.path()) {
        Some(rel) => separators(rel) < depth,
        None => false,
    }
}

fn relative<'a>(root: &Path, path: &'a Path) -> Option<&'a Path> {
    path.strip_prefix(root).ok()
}

/// Number of separators in a relative path: `a` has none, `a/config.xml` has one.
fn separators(rel: &Path) -> usize {
    rel.components().count().saturating_sub(1)
}
