use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::BenchError;

/// Split a `:`-separated directory list, dropping empty entries.
pub fn split_dirs(list: &str) -> Vec<PathBuf> {
    list.split(':')
        .filter(|item| !item.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Regular files in `dirs` whose file name contains `pattern` and whose
/// extension is `extension`. Directories are scanned in order; files within
/// one directory are sorted by path so runs line up positionally.
pub fn discover_targets(
    dirs: &[PathBuf],
    pattern: &str,
    extension: &str,
) -> Result<Vec<PathBuf>, BenchError> {
    let mut targets = Vec::new();
    for dir in dirs {
        let mut found = scan_dir(dir, pattern, extension)?;
        found.sort();
        targets.extend(found);
    }
    Ok(targets)
}

fn scan_dir(dir: &Path, pattern: &str, extension: &str) -> Result<Vec<PathBuf>, BenchError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| BenchError::storage(dir.display().to_string(), e.to_string()))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| BenchError::storage(dir.display().to_string(), e.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(pattern));
        let ext_matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == extension);
        if name_matches && ext_matches {
            found.push(path);
        }
    }
    Ok(found)
}
