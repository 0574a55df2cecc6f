use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::pipeline::common::error::{BenchError, Result};

/// Lists the images a driver should process, in the order the filesystem returns them.
///
/// Entries whose name starts with `.` are skipped, as is anything whose name
/// does not end with `extension`. Directories are never returned.
pub fn scan_directory(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        BenchError::InputReadError(format!("{}: {}", dir.display(), e))
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        info!(file = %name, "Found directory entry");

        if is_hidden(&name) {
            debug!(file = %name, "Skipping hidden entry");
            continue;
        }
        if !name.ends_with(extension) {
            debug!(file = %name, extension, "Skipping entry with other extension");
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }

        images.push(entry.path());
    }

    Ok(images)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
