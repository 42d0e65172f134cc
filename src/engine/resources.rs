//! Copies static template resources into the output root.

use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Outcome of a resource copy. Failures never abort the copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub failed: usize,
}

/// Recursively copies the contents of `source` into `target`, creating
/// directories as needed. Each failed directory creation or file copy is
/// logged and counted, and the walk moves on.
pub fn copy_resources(source: &Path, target: &Path) -> CopyStats {
    let mut stats = CopyStats::default();
    if !source.is_dir() {
        warn!("Resource directory '{}' is not a directory, nothing copied", source.display());
        return stats;
    }

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to read resource entry: {}", e);
                stats.failed += 1;
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            if destination.is_dir() {
                continue;
            }
            match fs::create_dir_all(&destination) {
                Ok(()) => info!("Created directory '{}'", destination.display()),
                Err(e) => {
                    error!("Failed to create directory '{}': {}", destination.display(), e);
                    stats.failed += 1;
                }
            }
            continue;
        }

        match fs::copy(entry.path(), &destination) {
            Ok(_) => {
                debug!("Copied resource '{}'", relative.display());
                stats.copied += 1;
            }
            Err(e) => {
                error!(
                    "Failed to copy '{}' to '{}': {}",
                    entry.path().display(),
                    destination.display(),
                    e
                );
                stats.failed += 1;
            }
        }
    }
    stats
}
