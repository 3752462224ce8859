//! Everything the steps share, built once at startup.

use std::time::Duration;

use tracing::debug;

use crate::assembler::ConfigAssembler;
use crate::certs::{CertificateBundle, CertificateProvisioner, CertificateTool, OpensslTool};
use crate::config::{InstallLayout, Settings, ToolsConfig};
use crate::error::ProvisionResult;
use crate::patch::PatchPolicy;
use crate::templates::TemplateEngine;

pub struct ProvisionContext {
    pub layout: InstallLayout,
    pub assembler: ConfigAssembler,
    pub certificates: CertificateProvisioner,
    pub tools: ToolsConfig,
    pub policy: PatchPolicy,
    /// Set by the certificate step; required by the TLS virtual host.
    pub(crate) certificate: Option<CertificateBundle>,
}

impl ProvisionContext {
    /// Build a context that generates certificates with openssl.
    pub fn new(layout: InstallLayout, settings: &Settings) -> ProvisionResult<Self> {
        let tool = OpensslTool::new(
            &settings.tools.openssl,
            Duration::from_secs(settings.tools.tool_timeout_seconds),
        );
        Self::with_certificate_tool(layout, settings, Box::new(tool))
    }

    /// Build a context around an arbitrary certificate generator.
    pub fn with_certificate_tool(
        layout: InstallLayout,
        settings: &Settings,
        tool: Box<dyn CertificateTool>,
    ) -> ProvisionResult<Self> {
        let templates = match &settings.paths.templates_dir {
            Some(dir) => TemplateEngine::with_overrides(dir)?,
            None => TemplateEngine::builtin()?,
        };
        debug!(templates = ?templates.template_names(), "Template engine ready");

        let assembler = ConfigAssembler::new(&layout, settings, templates.clone())?;
        let certificates = CertificateProvisioner::new(
            tool,
            templates,
            &layout.scratch_dir(),
            settings.tls.subject.clone(),
            settings.tls.key_bits,
            settings.tls.days,
        );

        Ok(Self {
            layout,
            assembler,
            certificates,
            tools: settings.tools.clone(),
            policy: PatchPolicy {
                strict: settings.patching.strict,
            },
            certificate: None,
        })
    }

    /// The key/certificate paths under the Apache config dir.
    pub fn certificate_bundle(&self) -> CertificateBundle {
        CertificateBundle::new(self.layout.private_key_path(), self.layout.certificate_path())
    }

    pub fn package_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.package_timeout_seconds)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.tool_timeout_seconds)
    }
}
