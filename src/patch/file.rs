//! Patching files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ProvisionError, ProvisionResult};
use crate::fs::{write_atomic, BackupGuard, DEFAULT_FILE_MODE};

use super::patcher::{apply, PatchOutcome};
use super::rule::DesiredState;

/// How unrecognized rules are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchPolicy {
    /// Fail with [`ProvisionError::ConfigFormat`] instead of warning.
    pub strict: bool,
}

/// Outcome of patching one file.
#[derive(Debug, Clone)]
pub struct FilePatchReport {
    pub path: PathBuf,
    pub outcome: PatchOutcome,
    /// A pristine backup was made during this call.
    pub backup_created: bool,
    /// The file was rewritten.
    pub written: bool,
}

/// A vendor file mutated in place, guarded by a pristine backup.
#[derive(Debug, Clone)]
pub struct ManagedFile {
    path: PathBuf,
    guard: BackupGuard,
}

impl ManagedFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            guard: BackupGuard::for_file(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn backup_path(&self) -> &Path {
        self.guard.backup_path()
    }

    pub fn read(&self) -> ProvisionResult<String> {
        fs::read_to_string(&self.path).map_err(|e| ProvisionError::io(&self.path, e))
    }

    /// Read, patch and, only if something changed, back up and rewrite.
    ///
    /// An unchanged file is not written, so its mtime is untouched. The
    /// backup is taken before the first write; failure to take it aborts
    /// the mutation.
    pub fn patch(&self, state: &DesiredState, policy: PatchPolicy) -> ProvisionResult<FilePatchReport> {
        if !self.exists() {
            return Err(ProvisionError::MissingPrerequisite {
                path: self.path.clone(),
                what: "configuration file".to_string(),
            });
        }

        let original = self.read()?;
        let outcome = apply(&original, state);

        let unrecognized = outcome.unrecognized();
        if !unrecognized.is_empty() {
            if policy.strict {
                return Err(ProvisionError::ConfigFormat {
                    path: self.path.clone(),
                    message: format!("no match for rule(s): {}", unrecognized.join(", ")),
                });
            }
            for rule in &unrecognized {
                warn!(
                    path = %self.path.display(),
                    rule = %rule,
                    "Rule matched nothing and is not already satisfied; the file format may have changed"
                );
            }
        }

        if !outcome.changed() {
            debug!(path = %self.path.display(), "File already in desired state");
            return Ok(FilePatchReport {
                path: self.path.clone(),
                outcome,
                backup_created: false,
                written: false,
            });
        }

        let backup_created = self.guard.ensure()?;
        write_atomic(&self.path, outcome.content.as_bytes(), DEFAULT_FILE_MODE)?;

        info!(
            path = %self.path.display(),
            rules_applied = outcome.applied_count(),
            blocks_inserted = outcome.inserted_count(),
            backup_created,
            "Patched configuration file"
        );

        Ok(FilePatchReport {
            path: self.path.clone(),
            outcome,
            backup_created,
            written: true,
        })
    }
}
