//! In-place patching of vendor configs, and the phpMyAdmin install.

use std::fs;

use tracing::{info, warn};

use crate::assembler::AdminUiChanges;
use crate::error::{ProvisionError, ProvisionResult};
use crate::executor::SubprocessBuilder;
use crate::patch::{FilePatchReport, ManagedFile};
use crate::pipeline::{ManagedConfig, ProvisionContext, StepOutcome};

pub fn patch_config(ctx: &ProvisionContext, which: ManagedConfig) -> ProvisionResult<StepOutcome> {
    match which {
        ManagedConfig::ServerConfig => patch_server_config(ctx),
        ManagedConfig::AdminUiConfig => {
            let (report, changes) = patch_admin_ui(ctx)?;
            Ok(admin_ui_outcome(&report, changes))
        }
    }
}

fn patch_server_config(ctx: &ProvisionContext) -> ProvisionResult<StepOutcome> {
    let file = ManagedFile::new(&ctx.layout.server_config());
    let report = file.patch(ctx.assembler.server_config(), ctx.policy)?;

    if !report.written {
        return Ok(StepOutcome::skipped(format!(
            "{} already configured",
            report.path.display()
        )));
    }

    let mut detail = format!(
        "Modified successfully ({} rule(s) applied, {} block(s) appended)",
        report.outcome.applied_count(),
        report.outcome.inserted_count()
    );
    if report.backup_created {
        detail.push_str(&format!("; backup at {}", file.backup_path().display()));
    }
    Ok(StepOutcome::performed(detail))
}

fn patch_admin_ui(ctx: &ProvisionContext) -> ProvisionResult<(FilePatchReport, AdminUiChanges)> {
    let file = ManagedFile::new(&ctx.layout.admin_ui_config());
    let report = file.patch(ctx.assembler.admin_ui_config(), ctx.policy)?;
    let changes = AdminUiChanges::from_outcome(&report.outcome);
    Ok((report, changes))
}

fn admin_ui_outcome(report: &FilePatchReport, changes: AdminUiChanges) -> StepOutcome {
    if report.written {
        StepOutcome::performed(changes.messages().join(", "))
    } else {
        StepOutcome::skipped("phpMyAdmin settings already applied")
    }
}

/// Fetch phpMyAdmin into the document root when absent, make sure
/// `config.inc.php` exists, then patch it.
pub fn install_admin_ui(ctx: &ProvisionContext) -> ProvisionResult<StepOutcome> {
    let dir = ctx.layout.admin_ui_dir();
    let config = ctx.layout.admin_ui_config();
    let sample = ctx.layout.admin_ui_sample_config();
    let mut notes: Vec<String> = Vec::new();

    if !dir.exists() {
        let result = SubprocessBuilder::new(&ctx.tools.composer)
            .args(["create-project", "-q", "phpmyadmin/phpmyadmin"])
            .current_dir(&ctx.layout.document_root)
            .timeout(ctx.package_timeout())
            .discard_output()
            .run();
        match result {
            Ok(r) if r.success => {
                info!(dir = %dir.display(), "phpMyAdmin installed");
                notes.push("phpMyAdmin has been installed".to_string());
            }
            Ok(r) => warn!(exit_code = ?r.exit_code, "composer create-project exited non-zero"),
            Err(e) => warn!(error = %e, "composer create-project could not run"),
        }
    }

    if !config.exists() {
        if !sample.exists() {
            return Err(ProvisionError::MissingPrerequisite {
                path: config,
                what: "phpMyAdmin configuration file".to_string(),
            });
        }
        fs::rename(&sample, &config).map_err(|e| ProvisionError::io(&sample, e))?;
        info!(from = %sample.display(), to = %config.display(), "Sample config renamed");
        notes.push("The configuration file has been renamed to config.inc.php".to_string());
    }

    let (report, changes) = patch_admin_ui(ctx)?;
    notes.extend(changes.messages().into_iter().map(String::from));

    if notes.is_empty() {
        Ok(admin_ui_outcome(&report, changes))
    } else {
        Ok(StepOutcome::performed(notes.join("; ")))
    }
}
