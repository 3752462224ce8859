//! Fully managed files, directories and permissions.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::certs::CertificateStatus;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fs::{set_mode, set_mode_recursive, write_atomic, write_if_changed, DEFAULT_FILE_MODE};
use crate::pipeline::{GeneratedFile, ProvisionContext, StepOutcome};

const DIRECTORY_MODE: u32 = 0o755;
const LAUNCHER_MODE: u32 = 0o755;

pub fn ensure_certificate(ctx: &mut ProvisionContext) -> ProvisionResult<StepOutcome> {
    let bundle = ctx.certificate_bundle();
    let status = ctx.certificates.ensure_certificate(&bundle)?;
    let outcome = match status {
        CertificateStatus::AlreadyPresent => {
            StepOutcome::skipped("The certificate already exists, skipping creation")
        }
        CertificateStatus::Generated => StepOutcome::performed(format!(
            "Certificate created at {}",
            bundle.certificate.display()
        )),
    };
    ctx.certificate = Some(bundle);
    Ok(outcome)
}

/// Render `file` and write it only if its content changed.
pub fn write_generated(ctx: &ProvisionContext, file: GeneratedFile) -> ProvisionResult<StepOutcome> {
    let (path, content) = match file {
        GeneratedFile::TlsVirtualHost => {
            let bundle = ctx.certificate.as_ref().ok_or_else(|| {
                ProvisionError::MissingPrerequisite {
                    path: ctx.layout.certificate_path(),
                    what: "TLS certificate (the certificate step has not run)".to_string(),
                }
            })?;
            (ctx.layout.tls_vhost_config(), ctx.assembler.tls_vhost(bundle)?)
        }
        GeneratedFile::DirectoryIndex => (
            ctx.layout.directory_index_file(),
            ctx.assembler.directory_index()?,
        ),
        GeneratedFile::RuntimeTuning => (ctx.layout.php_ini(), ctx.assembler.runtime_tuning()?),
    };

    if write_if_changed(&path, &content, DEFAULT_FILE_MODE)? {
        info!(path = %path.display(), "Managed file written");
        Ok(StepOutcome::performed(format!("Wrote {}", path.display())))
    } else {
        Ok(StepOutcome::skipped(format!("{} is up to date", path.display())))
    }
}

pub fn prepare_document_root(ctx: &ProvisionContext) -> ProvisionResult<StepOutcome> {
    let root = &ctx.layout.document_root;
    let existed = root.is_dir();
    fs::create_dir_all(root).map_err(|e| ProvisionError::io(root, e))?;
    set_mode(root, DIRECTORY_MODE)?;

    if existed {
        Ok(StepOutcome::skipped(format!("{} already exists", root.display())))
    } else {
        Ok(StepOutcome::performed(format!("Created {}", root.display())))
    }
}

pub fn set_permissions(path: &Path, mode: u32, recursive: bool) -> ProvisionResult<StepOutcome> {
    let count = if recursive {
        set_mode_recursive(path, mode)?
    } else {
        set_mode(path, mode)?;
        1
    };
    Ok(StepOutcome::performed(format!(
        "Mode {:o} applied to {} entries under {}",
        mode,
        count,
        path.display()
    )))
}

/// Copy the start script into `$PREFIX/bin` as an executable.
///
/// A missing source is not an error: the launcher ships separately.
pub fn install_launcher(ctx: &ProvisionContext) -> ProvisionResult<StepOutcome> {
    let source = &ctx.layout.launcher_source;
    let dest: PathBuf = ctx.layout.launcher_destination();

    if !source.is_file() {
        return Ok(StepOutcome::skipped(format!(
            "Launcher source {} not found",
            source.display()
        )));
    }

    let content = fs::read(source).map_err(|e| ProvisionError::io(source, e))?;
    if is_installed(&dest, &content)? {
        return Ok(StepOutcome::skipped(format!("{} is up to date", dest.display())));
    }

    write_atomic(&dest, &content, LAUNCHER_MODE)?;
    set_mode(&dest, LAUNCHER_MODE)?;
    info!(source = %source.display(), dest = %dest.display(), "Launcher installed");
    Ok(StepOutcome::performed(format!("Installed {}", dest.display())))
}

fn is_installed(dest: &Path, content: &[u8]) -> ProvisionResult<bool> {
    let existing = match fs::read(dest) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ProvisionError::io(dest, e)),
    };
    let mode = fs::metadata(dest)
        .map_err(|e| ProvisionError::io(dest, e))?
        .permissions()
        .mode()
        & 0o777;
    Ok(existing == content && mode == LAUNCHER_MODE)
}
