//! Private key / certificate pair on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

/// Paths to a private key and its certificate.
///
/// The pair is present only when both files exist and are non-empty; a
/// lone or zero-length file is what a failed earlier run leaves behind and
/// is regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateBundle {
    pub private_key: PathBuf,
    pub certificate: PathBuf,
}

impl CertificateBundle {
    pub fn new(private_key: impl Into<PathBuf>, certificate: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            certificate: certificate.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        is_non_empty_file(&self.private_key) && is_non_empty_file(&self.certificate)
    }

    /// Remove whatever a failed generation left behind.
    pub(crate) fn remove_partial(&self) {
        for path in [&self.private_key, &self.certificate] {
            match fs::remove_file(path) {
                Ok(()) => warn!(path = %path.display(), "Removed partial certificate artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial artifact"),
            }
        }
    }
}

fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
