//! External self-signed certificate generator.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{ProvisionError, ProvisionResult, ToolErrorKind};
use crate::executor::{tail_excerpt, SubprocessBuilder};

/// Parameters for one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub private_key: &'a Path,
    pub certificate: &'a Path,
    /// Request/extension config (subject, key usage, SANs).
    pub config: &'a Path,
    pub key_bits: u32,
    pub days: u32,
}

/// Produces a self-signed key/certificate pair.
///
/// Implementations must write both output paths on success and return an
/// error otherwise. The provisioner owns the config file's lifetime.
pub trait CertificateTool {
    fn generate(&self, request: &GenerationRequest<'_>) -> ProvisionResult<()>;
}

/// `openssl req -x509` backed generator.
pub struct OpensslTool {
    program: String,
    timeout: Duration,
}

impl OpensslTool {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    /// Arguments passed to the program for `request`.
    pub fn arguments(request: &GenerationRequest<'_>) -> Vec<String> {
        vec![
            "req".to_string(),
            "-x509".to_string(),
            "-nodes".to_string(),
            "-days".to_string(),
            request.days.to_string(),
            "-newkey".to_string(),
            format!("rsa:{}", request.key_bits),
            "-sha256".to_string(),
            "-keyout".to_string(),
            request.private_key.to_string_lossy().into_owned(),
            "-out".to_string(),
            request.certificate.to_string_lossy().into_owned(),
            "-config".to_string(),
            request.config.to_string_lossy().into_owned(),
        ]
    }
}

impl CertificateTool for OpensslTool {
    fn generate(&self, request: &GenerationRequest<'_>) -> ProvisionResult<()> {
        let result = SubprocessBuilder::new(&self.program)
            .args(Self::arguments(request))
            .timeout(self.timeout)
            .run()?;

        if !result.success {
            return Err(ProvisionError::ExternalTool {
                kind: ToolErrorKind::NonZeroExit {
                    program: self.program.clone(),
                    code: result.exit_code,
                    stderr: tail_excerpt(&result.stderr, 5),
                },
            });
        }

        debug!(program = %self.program, "Self-signed certificate generated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(key: &'a Path, cert: &'a Path, cnf: &'a Path) -> GenerationRequest<'a> {
        GenerationRequest {
            private_key: key,
            certificate: cert,
            config: cnf,
            key_bits: 2048,
            days: 365,
        }
    }

    #[test]
    fn test_arguments() {
        let args = OpensslTool::arguments(&request(
            Path::new("/a/server.key"),
            Path::new("/a/server.crt"),
            Path::new("/a/tmp/req.cnf"),
        ));
        let joined = args.join(" ");
        assert!(joined.starts_with("req -x509 -nodes -days 365 -newkey rsa:2048 -sha256"));
        assert!(joined.contains("-keyout /a/server.key"));
        assert!(joined.contains("-out /a/server.crt"));
        assert!(joined.ends_with("-config /a/tmp/req.cnf"));
    }

    #[test]
    fn test_non_zero_exit_is_external_tool_error() {
        let tool = OpensslTool::new("false", Duration::from_secs(5));
        let err = tool
            .generate(&request(Path::new("k"), Path::new("c"), Path::new("n")))
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ExternalTool {
                kind: ToolErrorKind::NonZeroExit { code: Some(1), .. }
            }
        ));
    }

    #[test]
    fn test_missing_program() {
        let tool = OpensslTool::new("openssl-does-not-exist-12345", Duration::from_secs(5));
        let err = tool
            .generate(&request(Path::new("k"), Path::new("c"), Path::new("n")))
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ExternalTool {
                kind: ToolErrorKind::Spawn { .. }
            }
        ));
    }
}
