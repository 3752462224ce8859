//! TLS certificate provisioning.
//!
//! [`CertificateProvisioner::ensure_certificate`] generates a self-signed
//! pair through a [`CertificateTool`] only when the pair is not already on
//! disk. The openssl request config is a [`crate::fs::ScopedFile`] and is
//! gone once the call returns, whatever the outcome.

mod bundle;
mod provisioner;
mod tool;

pub use bundle::CertificateBundle;
pub use provisioner::{CertificateProvisioner, CertificateStatus};
pub use tool::{CertificateTool, GenerationRequest, OpensslTool};
