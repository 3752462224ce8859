//! Atomic whole-file replacement.
//!
//! Content is written to an exclusively created sibling temp file, synced,
//! given its final permissions, then renamed over the target. A reader never
//! observes a partially written file, and the temp file is removed on every
//! error path by [`ScopedFile`].

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ProvisionError, ProvisionResult};

/// Mode for newly created managed files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// A file that is deleted when dropped unless it has been persisted.
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
    armed: bool,
}

impl ScopedFile {
    /// Exclusively create `path` (O_EXCL), failing if it already exists.
    pub fn create_new(path: &Path) -> ProvisionResult<(Self, File)> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| ProvisionError::io(path, e))?;
        Ok((
            Self {
                path: path.to_path_buf(),
                armed: true,
            },
            file,
        ))
    }

    /// Create a uniquely named file inside `dir`.
    ///
    /// The name is `.{stem}.{uuid}.{suffix}` so concurrent or stale files
    /// never collide.
    pub fn create_in(dir: &Path, stem: &str, suffix: &str) -> ProvisionResult<(Self, File)> {
        let name = format!(".{}.{}.{}", stem, Uuid::new_v4().simple(), suffix);
        Self::create_new(&dir.join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename onto `dest` and stop tracking the file.
    pub fn persist(mut self, dest: &Path) -> ProvisionResult<()> {
        fs::rename(&self.path, dest).map_err(|e| ProvisionError::io(dest, e))?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scoped file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove scoped file"),
        }
    }
}

/// Replace `path` with `content` atomically.
///
/// Existing permission bits are preserved; a new file gets `new_mode`.
pub fn write_atomic(path: &Path, content: &[u8], new_mode: u32) -> ProvisionResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
    }

    let mode = match fs::metadata(path) {
        Ok(meta) => meta.permissions().mode() & 0o7777,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => new_mode,
        Err(e) => return Err(ProvisionError::io(path, e)),
    };

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "managed".to_string());
    let (scoped, mut file) = ScopedFile::create_in(parent, &stem, "tmp")?;

    file.write_all(content)
        .map_err(|e| ProvisionError::io(scoped.path(), e))?;
    file.sync_all()
        .map_err(|e| ProvisionError::io(scoped.path(), e))?;
    fs::set_permissions(scoped.path(), fs::Permissions::from_mode(mode))
        .map_err(|e| ProvisionError::io(scoped.path(), e))?;
    drop(file);

    scoped.persist(path)?;

    debug!(path = %path.display(), bytes = content.len(), mode = format!("{:o}", mode), "File replaced");
    Ok(())
}

/// Write `content` only when it differs from what is on disk.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, content: &str, new_mode: u32) -> ProvisionResult<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ProvisionError::io(path, e)),
    }
    write_atomic(path, content.as_bytes(), new_mode)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftover_temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_write_atomic_creates_with_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/php.ini");

        write_atomic(&path, b"memory_limit = 512M\n", 0o640).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "memory_limit = 512M\n");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(leftover_temp_files(path.parent().unwrap()), 0);
    }

    #[test]
    fn test_write_atomic_preserves_existing_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("httpd.conf");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_atomic(&path, b"new", DEFAULT_FILE_MODE).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_write_if_changed_skips_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".htaccess");

        assert!(write_if_changed(&path, "DirectoryIndex index.php", DEFAULT_FILE_MODE).unwrap());
        assert!(!write_if_changed(&path, "DirectoryIndex index.php", DEFAULT_FILE_MODE).unwrap());
        assert!(write_if_changed(&path, "DirectoryIndex index.html", DEFAULT_FILE_MODE).unwrap());
    }

    #[test]
    fn test_scoped_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let (scoped, mut file) = ScopedFile::create_in(dir.path(), "req", "cnf").unwrap();
            file.write_all(b"[req]").unwrap();
            assert!(scoped.path().exists());
            scoped.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scoped_file_create_new_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken");
        fs::write(&path, "x").unwrap();

        assert!(ScopedFile::create_new(&path).is_err());
        // The pre-existing file must not be removed by a failed guard.
        assert!(path.exists());
    }
}
