//! Provisioning steps and the default step table.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::{InstallLayout, Settings};

/// A program and its arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A vendor file patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedConfig {
    ServerConfig,
    AdminUiConfig,
}

/// A file rendered in full and owned by the provisioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedFile {
    TlsVirtualHost,
    DirectoryIndex,
    RuntimeTuning,
}

/// What a step does, with everything it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run each command in turn, output discarded.
    RunCommand {
        commands: Vec<CommandLine>,
        /// Fail the step on a non-zero exit instead of warning.
        check_status: bool,
    },
    /// Link shared storage unless it already is.
    EnsureStorage,
    EnsureCertificate,
    PatchConfig(ManagedConfig),
    WriteFile(GeneratedFile),
    /// Create the document root with mode 0755.
    PrepareDocumentRoot,
    /// Fetch phpMyAdmin if needed, then materialize and patch its config.
    InstallAdminUi,
    /// Copy the start script into `$PREFIX/bin`.
    InstallLauncher,
    SetPermissions {
        path: PathBuf,
        mode: u32,
        recursive: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningStep {
    /// Display name used in progress output and the journal.
    pub name: String,
    pub action: StepAction,
}

impl ProvisioningStep {
    pub fn new(name: &str, action: StepAction) -> Self {
        Self {
            name: name.to_string(),
            action,
        }
    }
}

/// The full provisioning run, in the order later steps depend on.
///
/// The certificate step precedes the TLS virtual host because the host
/// embeds the certificate paths.
pub fn default_steps(settings: &Settings, layout: &InstallLayout) -> Vec<ProvisioningStep> {
    let pkg = settings.tools.package_manager.as_str();
    let check_status = settings.packages.check_status;

    let mut install = vec!["install".to_string(), "-y".to_string()];
    install.extend(settings.packages.install.iter().cloned());

    vec![
        ProvisioningStep::new(
            "Update packages",
            StepAction::RunCommand {
                commands: vec![
                    CommandLine::new(pkg, ["update", "-y"]),
                    CommandLine::new(pkg, ["upgrade", "-y"]),
                ],
                check_status,
            },
        ),
        ProvisioningStep::new("Storage settings", StepAction::EnsureStorage),
        ProvisioningStep::new(
            "Install packages",
            StepAction::RunCommand {
                commands: vec![CommandLine::new(pkg, install)],
                check_status,
            },
        ),
        ProvisioningStep::new("TLS certificate", StepAction::EnsureCertificate),
        ProvisioningStep::new(
            "TLS virtual host",
            StepAction::WriteFile(GeneratedFile::TlsVirtualHost),
        ),
        ProvisioningStep::new(
            "Apache settings",
            StepAction::PatchConfig(ManagedConfig::ServerConfig),
        ),
        ProvisioningStep::new("Document root", StepAction::PrepareDocumentRoot),
        ProvisioningStep::new(
            "Directory index file",
            StepAction::WriteFile(GeneratedFile::DirectoryIndex),
        ),
        ProvisioningStep::new("phpMyAdmin", StepAction::InstallAdminUi),
        ProvisioningStep::new("Launcher", StepAction::InstallLauncher),
        ProvisioningStep::new(
            "Runtime tuning",
            StepAction::WriteFile(GeneratedFile::RuntimeTuning),
        ),
        ProvisioningStep::new(
            "Permissions",
            StepAction::SetPermissions {
                path: layout.document_root.clone(),
                mode: 0o755,
                recursive: true,
            },
        ),
    ]
}
