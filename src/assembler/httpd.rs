//! Rule table for the primary Apache config (`httpd.conf`).

use std::path::Path;

use crate::error::ProvisionResult;
use crate::patch::{AppendBlock, DesiredState, RewriteRule};

pub const DOCUMENT_ROOT: &str = "document-root";
pub const DIRECTORY_ROOT: &str = "directory-root";
pub const MPM_WORKER_OFF: &str = "mpm-worker-off";
pub const MPM_PREFORK_ON: &str = "mpm-prefork-on";
pub const SSL_MODULE_ON: &str = "ssl-module-on";
pub const DIRECTORY_INDEX: &str = "directory-index";
pub const TLS_INCLUDE: &str = "tls-include";
pub const ROOT_DIRECTORY_BLOCK: &str = "document-root-directory";
pub const PHP_MODULE: &str = "php-module";

/// The rewrite ids that toggle the process-model modules.
pub const MPM_RULES: [&str; 2] = [MPM_WORKER_OFF, MPM_PREFORK_ON];

/// Inputs the server config depends on.
#[derive(Debug, Clone, Copy)]
pub struct ServerParams<'a> {
    pub document_root: &'a Path,
    /// The TLS virtual-host file to `Include`.
    pub tls_include: &'a Path,
    /// The PHP Apache module.
    pub php_module: &'a Path,
}

/// Build the desired state of `httpd.conf`.
///
/// Rules are line-anchored where the directive starts a line, so commented
/// or nested mentions are left alone. The process-model and TLS module
/// rules each carry a satisfied pattern and are independent of each other.
pub fn desired_state(params: &ServerParams<'_>) -> ProvisionResult<DesiredState> {
    let root = params.document_root.display();
    let directory_open = format!(r#"<Directory "{}">"#, root);

    let state = DesiredState::new()
        .rule(RewriteRule::literal(
            DOCUMENT_ROOT,
            r#"(?m)^DocumentRoot\s+".*""#,
            format!(r#"DocumentRoot "{}""#, root),
        )?)
        .rule(RewriteRule::literal(
            DIRECTORY_ROOT,
            r#"<Directory\s+".*">"#,
            directory_open.clone(),
        )?)
        .rule(
            RewriteRule::literal(
                MPM_WORKER_OFF,
                r"(?m)^LoadModule mpm_worker_module\b.*",
                "#LoadModule mpm_worker_module libexec/apache2/mod_mpm_worker.so",
            )?
            .satisfied_when(r"(?m)^#LoadModule mpm_worker_module\b")?,
        )
        .rule(
            RewriteRule::literal(
                MPM_PREFORK_ON,
                r"(?m)^#LoadModule mpm_prefork_module\b.*",
                "LoadModule mpm_prefork_module libexec/apache2/mod_mpm_prefork.so",
            )?
            .satisfied_when(r"(?m)^LoadModule mpm_prefork_module\b")?,
        )
        .rule(
            RewriteRule::literal(
                SSL_MODULE_ON,
                r"(?m)^#LoadModule ssl_module\b.*",
                "LoadModule ssl_module libexec/apache2/mod_ssl.so",
            )?
            .satisfied_when(r"(?m)^LoadModule ssl_module\b")?,
        )
        .rule(RewriteRule::literal(
            DIRECTORY_INDEX,
            r"(?s)<IfModule dir_module>.*?DirectoryIndex\s+.*?</IfModule>",
            "<IfModule dir_module>\n    DirectoryIndex index.php index.html\n</IfModule>",
        )?)
        .append(AppendBlock::line(
            TLS_INCLUDE,
            format!("Include {}", params.tls_include.display()),
        ))
        .append(AppendBlock::new(
            ROOT_DIRECTORY_BLOCK,
            directory_open.clone(),
            format!(
                "{}\n    Options Indexes FollowSymLinks\n    AllowOverride All\n    Require all granted\n</Directory>",
                directory_open
            ),
        ))
        .append(AppendBlock::new(
            PHP_MODULE,
            "LoadModule php_module",
            format!(
                "# PHP configuration\nLoadModule php_module {}\n<FilesMatch \\.php$>\n    SetHandler application/x-httpd-php\n</FilesMatch>",
                params.php_module.display()
            ),
        ));

    Ok(state)
}
