use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::{Entry, MenuError};

/// Every executable found directly inside one of `$PATH`'s directories,
/// sorted and deduplicated, as launcher entries.
pub fn executables() -> Vec<Entry> {
    let path = std::env::var_os("PATH").unwrap_or_default();
    executables_in(std::env::split_paths(&path))
        .into_iter()
        .map(Entry::command)
        .collect()
}

pub fn executables_in(dirs: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    let mut names = Vec::new();
    for dir in dirs {
        if let Err(e) = scan_dir(&dir, &mut names) {
            debug!("Skipping {}: {}", dir.display(), e);
        }
    }
    names.sort();
    names.dedup();
    names
}

fn scan_dir(dir: &Path, names: &mut Vec<String>) -> Result<(), MenuError> {
    let dir = std::fs::canonicalize(dir)?;
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let metadata = entry.metadata()?;
        if metadata.is_dir() || metadata.permissions().mode() & 0o111 == 0 {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(())
}
