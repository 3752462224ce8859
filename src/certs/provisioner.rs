//! Idempotent TLS key/certificate provisioning.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::SubjectConfig;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fs::{set_mode, ScopedFile};
use crate::templates::{builtin, TemplateEngine};

use super::bundle::CertificateBundle;
use super::tool::{CertificateTool, GenerationRequest};

/// Whether the pair had to be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    AlreadyPresent,
    Generated,
}

/// Ensures a self-signed key/certificate pair exists.
pub struct CertificateProvisioner {
    tool: Box<dyn CertificateTool>,
    templates: TemplateEngine,
    scratch_dir: PathBuf,
    subject: SubjectConfig,
    key_bits: u32,
    days: u32,
}

impl CertificateProvisioner {
    pub fn new(
        tool: Box<dyn CertificateTool>,
        templates: TemplateEngine,
        scratch_dir: &Path,
        subject: SubjectConfig,
        key_bits: u32,
        days: u32,
    ) -> Self {
        Self {
            tool,
            templates,
            scratch_dir: scratch_dir.to_path_buf(),
            subject,
            key_bits,
            days,
        }
    }

    /// Render the openssl request/extension config.
    pub fn request_config(&self) -> ProvisionResult<String> {
        self.templates.render(
            builtin::CERT_REQUEST,
            &serde_json::json!({
                "key_bits": self.key_bits,
                "subject": &self.subject,
            }),
        )
    }

    /// Generate the pair unless both files are already present.
    ///
    /// Any failure is reported as [`ProvisionError::CertificateGeneration`].
    /// The temporary request config never outlives this call.
    pub fn ensure_certificate(&self, bundle: &CertificateBundle) -> ProvisionResult<CertificateStatus> {
        if bundle.is_present() {
            info!(
                certificate = %bundle.certificate.display(),
                "Certificate already present, skipping generation"
            );
            return Ok(CertificateStatus::AlreadyPresent);
        }

        self.generate(bundle).map_err(ProvisionError::certificate)?;

        info!(
            certificate = %bundle.certificate.display(),
            private_key = %bundle.private_key.display(),
            "Certificate created"
        );
        Ok(CertificateStatus::Generated)
    }

    fn generate(&self, bundle: &CertificateBundle) -> ProvisionResult<()> {
        let request_config = self.request_config()?;

        fs::create_dir_all(&self.scratch_dir).map_err(|e| ProvisionError::io(&self.scratch_dir, e))?;
        for path in [&bundle.private_key, &bundle.certificate] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
            }
        }

        // Dropped on every return path below, which deletes the file.
        let (config, mut file) = ScopedFile::create_in(&self.scratch_dir, "openssl_apache", "cnf")?;
        file.write_all(request_config.as_bytes())
            .map_err(|e| ProvisionError::io(config.path(), e))?;
        file.sync_all()
            .map_err(|e| ProvisionError::io(config.path(), e))?;
        drop(file);

        debug!(config = %config.path().display(), "Wrote temporary request config");

        let request = GenerationRequest {
            private_key: &bundle.private_key,
            certificate: &bundle.certificate,
            config: config.path(),
            key_bits: self.key_bits,
            days: self.days,
        };
        if let Err(e) = self.tool.generate(&request) {
            bundle.remove_partial();
            return Err(e);
        }

        if !bundle.is_present() {
            let missing = if bundle.private_key.exists() {
                &bundle.certificate
            } else {
                &bundle.private_key
            };
            bundle.remove_partial();
            return Err(ProvisionError::io(
                missing,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "generator reported success but did not produce the file",
                ),
            ));
        }

        set_mode(&bundle.private_key, 0o600)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        KeyOnlyThenFail,
        SucceedWithoutOutput,
    }

    /// Records calls and the config it was handed.
    struct FakeTool {
        behavior: Behavior,
        calls: Rc<Cell<usize>>,
        seen_config: Rc<RefCell<Option<(PathBuf, String)>>>,
    }

    impl CertificateTool for FakeTool {
        fn generate(&self, request: &GenerationRequest<'_>) -> ProvisionResult<()> {
            self.calls.set(self.calls.get() + 1);
            let content = fs::read_to_string(request.config).unwrap();
            *self.seen_config.borrow_mut() = Some((request.config.to_path_buf(), content));
            match self.behavior {
                Behavior::Succeed => {
                    fs::write(request.private_key, "KEY").unwrap();
                    fs::write(request.certificate, "CERT").unwrap();
                    Ok(())
                }
                Behavior::SucceedWithoutOutput => Ok(()),
                Behavior::KeyOnlyThenFail => {
                    fs::write(request.private_key, "HALF").unwrap();
                    Err(tool_failure())
                }
                Behavior::Fail => Err(tool_failure()),
            }
        }
    }

    fn tool_failure() -> ProvisionError {
        ProvisionError::ExternalTool {
            kind: crate::error::ToolErrorKind::NonZeroExit {
                program: "openssl".to_string(),
                code: Some(1),
                stderr: "boom".to_string(),
            },
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        scratch: PathBuf,
        bundle: CertificateBundle,
        calls: Rc<Cell<usize>>,
        seen: Rc<RefCell<Option<(PathBuf, String)>>>,
        provisioner: CertificateProvisioner,
    }

    fn fixture(behavior: Behavior) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let apache = dir.path().join("etc/apache2");
        let scratch = apache.join("tmp");
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(None));
        let tool = FakeTool {
            behavior,
            calls: Rc::clone(&calls),
            seen_config: Rc::clone(&seen),
        };
        let provisioner = CertificateProvisioner::new(
            Box::new(tool),
            TemplateEngine::builtin().unwrap(),
            &scratch,
            SubjectConfig::default(),
            2048,
            365,
        );
        Fixture {
            bundle: CertificateBundle::new(apache.join("server.key"), apache.join("server.crt")),
            _dir: dir,
            scratch,
            calls,
            seen,
            provisioner,
        }
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        !dir.exists() || fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_request_config_contents() {
        let fx = fixture(Behavior::Succeed);
        let cnf = fx.provisioner.request_config().unwrap();
        assert!(cnf.contains("prompt = no"));
        assert!(cnf.contains("default_bits = 2048"));
        assert!(cnf.contains("default_md = sha256"));
        assert!(cnf.contains("CN = localhost"));
        assert!(cnf.contains("keyUsage = digitalSignature, keyEncipherment, nonRepudiation"));
        assert!(cnf.contains("extendedKeyUsage = serverAuth, clientAuth"));
        assert!(cnf.contains("DNS.1 = localhost\n"));
        assert!(cnf.contains("DNS.2 = localhost.localdomain\n"));
        assert!(cnf.contains("IP.1 = 127.0.0.1\n"));
        assert!(cnf.contains("IP.2 = ::1\n"));
    }

    #[test]
    fn test_generates_when_missing_and_cleans_config() {
        let fx = fixture(Behavior::Succeed);

        let status = fx.provisioner.ensure_certificate(&fx.bundle).unwrap();

        assert_eq!(status, CertificateStatus::Generated);
        assert_eq!(fx.calls.get(), 1);
        assert!(fx.bundle.is_present());
        let (config_path, content) = fx.seen.borrow().clone().unwrap();
        assert!(config_path.starts_with(&fx.scratch));
        assert!(content.contains("subjectAltName = @alt_names"));
        assert!(!config_path.exists());
        assert!(scratch_is_empty(&fx.scratch));

        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&fx.bundle.private_key).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_second_call_skips_tool() {
        let fx = fixture(Behavior::Succeed);
        fx.provisioner.ensure_certificate(&fx.bundle).unwrap();

        let status = fx.provisioner.ensure_certificate(&fx.bundle).unwrap();

        assert_eq!(status, CertificateStatus::AlreadyPresent);
        assert_eq!(fx.calls.get(), 1);
    }

    #[test]
    fn test_existing_pair_untouched() {
        let fx = fixture(Behavior::Fail);
        fs::create_dir_all(fx.bundle.private_key.parent().unwrap()).unwrap();
        fs::write(&fx.bundle.private_key, "EXISTING KEY").unwrap();
        fs::write(&fx.bundle.certificate, "EXISTING CERT").unwrap();

        let status = fx.provisioner.ensure_certificate(&fx.bundle).unwrap();

        assert_eq!(status, CertificateStatus::AlreadyPresent);
        assert_eq!(fx.calls.get(), 0);
        assert_eq!(fs::read_to_string(&fx.bundle.private_key).unwrap(), "EXISTING KEY");
        assert_eq!(fs::read_to_string(&fx.bundle.certificate).unwrap(), "EXISTING CERT");
    }

    #[test]
    fn test_half_pair_regenerated() {
        let fx = fixture(Behavior::Succeed);
        fs::create_dir_all(fx.bundle.certificate.parent().unwrap()).unwrap();
        fs::write(&fx.bundle.certificate, "STALE").unwrap();

        let status = fx.provisioner.ensure_certificate(&fx.bundle).unwrap();

        assert_eq!(status, CertificateStatus::Generated);
        assert_eq!(fs::read_to_string(&fx.bundle.certificate).unwrap(), "CERT");
    }

    #[test]
    fn test_tool_failure_leaves_no_temp_config() {
        let fx = fixture(Behavior::Fail);

        let err = fx.provisioner.ensure_certificate(&fx.bundle).unwrap_err();

        assert!(matches!(err, ProvisionError::CertificateGeneration { .. }));
        assert_eq!(fx.calls.get(), 1);
        assert!(scratch_is_empty(&fx.scratch));
    }

    #[test]
    fn test_partial_key_removed_on_failure() {
        let fx = fixture(Behavior::KeyOnlyThenFail);

        assert!(fx.provisioner.ensure_certificate(&fx.bundle).is_err());

        assert!(!fx.bundle.private_key.exists());
        assert!(!fx.bundle.certificate.exists());
        assert!(scratch_is_empty(&fx.scratch));
    }

    #[test]
    fn test_success_without_output_is_failure() {
        let fx = fixture(Behavior::SucceedWithoutOutput);
        let err = fx.provisioner.ensure_certificate(&fx.bundle).unwrap_err();
        assert!(matches!(err, ProvisionError::CertificateGeneration { .. }));
        assert!(scratch_is_empty(&fx.scratch));
    }

    #[test]
    fn test_real_process_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("tmp");
        let provisioner = CertificateProvisioner::new(
            Box::new(super::super::tool::OpensslTool::new(
                "false",
                std::time::Duration::from_secs(5),
            )),
            TemplateEngine::builtin().unwrap(),
            &scratch,
            SubjectConfig::default(),
            2048,
            365,
        );
        let bundle = CertificateBundle::new(dir.path().join("server.key"), dir.path().join("server.crt"));

        let err = provisioner.ensure_certificate(&bundle).unwrap_err();

        assert!(err.to_string().contains("Certificate generation failed"));
        assert!(scratch_is_empty(&scratch));
    }
}
