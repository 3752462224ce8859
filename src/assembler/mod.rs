//! Desired state for every managed file.
//!
//! The [`ConfigAssembler`] is built once from the resolved
//! [`InstallLayout`] and [`Settings`]. All rule tables are compiled in
//! [`ConfigAssembler::new`], so a malformed pattern stops the program before
//! any file is touched. Nothing here reads or writes the filesystem.

pub mod admin_ui;
mod generated;
pub mod httpd;

use std::path::PathBuf;

use tracing::debug;

use crate::config::{InstallLayout, PhpConfig, Settings};
use crate::error::ProvisionResult;
use crate::patch::DesiredState;
use crate::templates::TemplateEngine;

pub use admin_ui::AdminUiChanges;
pub use generated::INDEX_FILES;
pub use httpd::ServerParams;

pub struct ConfigAssembler {
    server_config: DesiredState,
    admin_ui_config: DesiredState,
    templates: TemplateEngine,
    document_root: PathBuf,
    tls_port: u16,
    php: PhpConfig,
}

impl ConfigAssembler {
    pub fn new(
        layout: &InstallLayout,
        settings: &Settings,
        templates: TemplateEngine,
    ) -> ProvisionResult<Self> {
        let tls_include = layout.tls_vhost_config();
        let php_module = layout.php_module();
        let server_config = httpd::desired_state(&ServerParams {
            document_root: &layout.document_root,
            tls_include: &tls_include,
            php_module: &php_module,
        })?;
        let admin_ui_config = admin_ui::desired_state()?;

        debug!(
            server_rules = server_config.rules().len(),
            server_blocks = server_config.blocks().len(),
            admin_rules = admin_ui_config.rules().len(),
            "Rule tables compiled"
        );

        Ok(Self {
            server_config,
            admin_ui_config,
            templates,
            document_root: layout.document_root.clone(),
            tls_port: settings.tls.listen_port,
            php: settings.php.clone(),
        })
    }

    pub fn server_config(&self) -> &DesiredState {
        &self.server_config
    }

    pub fn admin_ui_config(&self) -> &DesiredState {
        &self.admin_ui_config
    }
}
