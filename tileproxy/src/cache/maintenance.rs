//! Offline cache inspection and cleanup used by the CLI.

use std::io;
use std::path::Path;

/// Result of clearing the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: usize,
    pub bytes_freed: u64,
}

/// Count files and total bytes under `root`.
///
/// A missing root is an empty cache.
pub fn disk_cache_stats(root: &Path) -> io::Result<(usize, u64)> {
    if !root.exists() {
        return Ok((0, 0));
    }
    let mut files = 0;
    let mut bytes = 0;
    visit_files(root, &mut |_, len| {
        files += 1;
        bytes += len;
    })?;
    Ok((files, bytes))
}

/// Delete every file and subdirectory under `root`, keeping `root`.
pub fn clear_disk_cache(root: &Path) -> io::Result<ClearResult> {
    if !root.exists() {
        return Ok(ClearResult::default());
    }

    let mut result = ClearResult::default();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            let (files, bytes) = disk_cache_stats(&path)?;
            std::fs::remove_dir_all(&path)?;
            result.files_deleted += files;
            result.bytes_freed += bytes;
        } else {
            let len = entry.metadata()?.len();
            std::fs::remove_file(&path)?;
            result.files_deleted += 1;
            result.bytes_freed += len;
        }
    }
    Ok(result)
}

fn visit_files(dir: &Path, visit: &mut dyn FnMut(&Path, u64)) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            visit_files(&path, visit)?;
        } else if file_type.is_file() {
            visit(&path, entry.metadata()?.len());
        }
    }
    Ok(())
}
