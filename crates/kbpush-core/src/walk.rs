//! Directory traversal: every regular file under the root, unfiltered

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::{KbError, Result};

/// Collect every regular file beneath `root`, sorted by path within each directory.
///
/// Hidden files and ignore files are not honored: everything is visited.
/// Symlinks to files are listed; symlinked directories are not descended into.
/// Entries that cannot be read are logged and skipped.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(KbError::RootNotFound(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };

        let is_file = if file_type.is_symlink() {
            std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file())
        } else {
            file_type.is_file()
        };

        if is_file {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Path of `path` relative to `root`, as stored in chunk metadata.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
