//! Step implementations.
//!
//! [`ProvisionContext`] executes each [`StepAction`] variant here. Every
//! step is safe to run again: it inspects the current state first and
//! reports `Skipped` when there is nothing to do.

mod commands;
mod config;
mod files;

use tracing::debug;

use crate::error::ProvisionResult;
use crate::pipeline::{ProvisionContext, ProvisioningStep, StepAction, StepExecutor, StepOutcome};

impl StepExecutor for ProvisionContext {
    fn execute(&mut self, step: &ProvisioningStep) -> ProvisionResult<StepOutcome> {
        debug!(step = %step.name, action = ?step.action, "Executing step");
        match &step.action {
            StepAction::RunCommand {
                commands,
                check_status,
            } => commands::run_commands(self, commands, *check_status),
            StepAction::EnsureStorage => commands::ensure_storage(self),
            StepAction::EnsureCertificate => files::ensure_certificate(self),
            StepAction::PatchConfig(which) => config::patch_config(self, *which),
            StepAction::WriteFile(file) => files::write_generated(self, *file),
            StepAction::PrepareDocumentRoot => files::prepare_document_root(self),
            StepAction::InstallAdminUi => config::install_admin_ui(self),
            StepAction::InstallLauncher => files::install_launcher(self),
            StepAction::SetPermissions {
                path,
                mode,
                recursive,
            } => files::set_permissions(path, *mode, *recursive),
        }
    }
}
