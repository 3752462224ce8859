//! Permission bit helpers.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ProvisionError, ProvisionResult};

/// Set `mode` on a single path. Symlinks are refused.
pub fn set_mode(path: &Path, mode: u32) -> ProvisionResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| ProvisionError::io(path, e))?;
    if metadata.file_type().is_symlink() {
        return Err(ProvisionError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "refusing to change permissions through a symlink",
            ),
        ));
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ProvisionError::io(path, e))
}

/// Recursively set permissions on a directory and its contents.
///
/// Uses `symlink_metadata` so links inside the tree are skipped rather than
/// followed out of it. Returns the number of entries changed.
pub fn set_mode_recursive(path: &Path, mode: u32) -> ProvisionResult<usize> {
    let mut count = 0;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ProvisionError::io(path, e))?;
    count += 1;

    let entries = fs::read_dir(path).map_err(|e| ProvisionError::io(path, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ProvisionError::io(path, e))?;
        let entry_path = entry.path();

        let metadata =
            fs::symlink_metadata(&entry_path).map_err(|e| ProvisionError::io(&entry_path, e))?;

        if metadata.file_type().is_symlink() {
            warn!(path = %entry_path.display(), "Skipping symlink during recursive chmod");
            continue;
        }

        if metadata.is_dir() {
            count += set_mode_recursive(&entry_path, mode)?;
        } else {
            fs::set_permissions(&entry_path, fs::Permissions::from_mode(mode))
                .map_err(|e| ProvisionError::io(&entry_path, e))?;
            count += 1;
        }
    }

    debug!(path = %path.display(), mode = format!("{:o}", mode), count, "Permissions applied");
    Ok(count)
}
