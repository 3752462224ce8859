//! Files owned outright by the provisioner and rendered in full.

use serde_json::json;

use crate::certs::CertificateBundle;
use crate::error::ProvisionResult;
use crate::templates::builtin;

use super::ConfigAssembler;

/// Fallback documents in precedence order.
pub const INDEX_FILES: [&str; 6] = [
    "index.php",
    "index.html",
    "index.htm",
    "index2.html",
    "default.html",
    "default.htm",
];

impl ConfigAssembler {
    /// TLS virtual host embedding the bundle's resolved paths.
    pub fn tls_vhost(&self, bundle: &CertificateBundle) -> ProvisionResult<String> {
        self.templates.render(
            builtin::TLS_VHOST,
            &json!({
                "port": self.tls_port,
                "certificate": bundle.certificate.display().to_string(),
                "private_key": bundle.private_key.display().to_string(),
                "document_root": self.document_root.display().to_string(),
            }),
        )
    }

    /// `.htaccess` with the directory-index directive.
    pub fn directory_index(&self) -> ProvisionResult<String> {
        self.templates
            .render(builtin::DIRECTORY_INDEX, &json!({ "index_files": INDEX_FILES }))
    }

    /// `php.ini` runtime limits.
    pub fn runtime_tuning(&self) -> ProvisionResult<String> {
        let context = serde_json::to_value(&self.php)?;
        self.templates.render(builtin::RUNTIME_TUNING, &context)
    }
}
