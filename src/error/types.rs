//! Error types for the provisioner.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for provisioning operations.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Settings file could not be read, parsed or validated.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File read/write/permission failure on a specific path.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external program failed or could not be run.
    #[error("External tool error: {kind}")]
    ExternalTool { kind: ToolErrorKind },

    /// A vendor file the system expects to already exist is absent.
    #[error("Missing prerequisite {what}: '{}' not found", path.display())]
    MissingPrerequisite { path: PathBuf, what: String },

    /// A file that must be patched does not look like what the rules expect.
    #[error("Unrecognized format in '{}': {message}", path.display())]
    ConfigFormat { path: PathBuf, message: String },

    /// The TLS key/certificate pair could not be produced.
    #[error("Certificate generation failed: {source}")]
    CertificateGeneration {
        #[source]
        source: Box<ProvisionError>,
    },

    /// A rewrite pattern failed to compile.
    #[error("Invalid rewrite rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// External tool error kinds.
#[derive(Error, Debug)]
pub enum ToolErrorKind {
    #[error("failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with status {}: {stderr}", display_code(*code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl ProvisionError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error as a certificate generation failure.
    pub fn certificate(source: ProvisionError) -> Self {
        Self::CertificateGeneration {
            source: Box::new(source),
        }
    }
}

/// Result type alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
