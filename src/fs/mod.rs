//! Filesystem primitives: atomic replacement, scoped temp files, pristine
//! backups and permission changes.

mod atomic;
mod backup;
mod permissions;

pub use atomic::{write_atomic, write_if_changed, ScopedFile, DEFAULT_FILE_MODE};
pub use backup::{ensure_backup, BackupGuard};
pub use permissions::{set_mode, set_mode_recursive};
