//! Pristine backups of vendor files.

use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ProvisionError, ProvisionResult};

use super::atomic::ScopedFile;

/// Guards a target file with a single pristine backup.
///
/// The backup lives next to the target with its last extension replaced by
/// `.bak` (`httpd.conf` -> `httpd.bak`). Its existence is the idempotency
/// marker: once present it is never overwritten or removed, so it always
/// holds the content from before the very first mutation.
#[derive(Debug, Clone)]
pub struct BackupGuard {
    target: PathBuf,
    backup: PathBuf,
}

impl BackupGuard {
    pub fn for_file(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            backup: target.with_extension("bak"),
        }
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn exists(&self) -> bool {
        fs::symlink_metadata(&self.backup).is_ok()
    }

    /// Make sure the backup exists, copying the target if it does not.
    ///
    /// Returns whether a new backup was created. The copy is staged in a
    /// temp file and renamed into place, so a half-written backup is never
    /// mistaken for a complete one on the next run.
    pub fn ensure(&self) -> ProvisionResult<bool> {
        if self.exists() {
            debug!(backup = %self.backup.display(), "Backup already present");
            return Ok(false);
        }

        let mut source = File::open(&self.target).map_err(|e| ProvisionError::io(&self.target, e))?;
        let meta = source
            .metadata()
            .map_err(|e| ProvisionError::io(&self.target, e))?;

        let dir = match self.backup.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let stem = self
            .backup
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "backup".to_string());
        let (staged, mut dest) = ScopedFile::create_in(dir, &stem, "tmp")?;

        io::copy(&mut source, &mut dest).map_err(|e| ProvisionError::io(staged.path(), e))?;
        dest.sync_all()
            .map_err(|e| ProvisionError::io(staged.path(), e))?;
        fs::set_permissions(
            staged.path(),
            fs::Permissions::from_mode(meta.permissions().mode() & 0o7777),
        )
        .map_err(|e| ProvisionError::io(staged.path(), e))?;
        drop(dest);

        staged.persist(&self.backup)?;

        info!(
            target = %self.target.display(),
            backup = %self.backup.display(),
            "Created pristine backup"
        );
        Ok(true)
    }
}

/// Ensure a backup of `path` exists. Returns whether one was created.
pub fn ensure_backup(path: &Path) -> ProvisionResult<bool> {
    BackupGuard::for_file(path).ensure()
}
