//! Java source discovery under an analysis root.

use crate::core::errors::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names that never hold sources worth analyzing.
const SKIPPED_DIRS: &[&str] = &["target", "build", "out", "node_modules"];

fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref())
}

fn is_java_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "java").unwrap_or(false)
}

/// Every `.java` file under `root`, in sorted path order.
pub fn find_java_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry));
    for entry in walker {
        let entry = entry.map_err(|e| {
            Error::file_system(
                format!("Failed to walk {}", root.display()),
                root,
                e.into(),
            )
        })?;
        if entry.file_type().is_file() && is_java_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
