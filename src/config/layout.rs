//! Resolved filesystem layout of the installation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

use super::settings::Settings;

/// Process environment captured once at startup.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Value of `$PREFIX`.
    pub prefix: Option<OsString>,
    /// The user's home directory.
    pub home: Option<PathBuf>,
}

impl Environment {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        Self {
            prefix: std::env::var_os("PREFIX"),
            home: dirs::home_dir(),
        }
    }
}

/// Every path the provisioner reads or writes, derived from the install
/// prefix, the home directory and the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub prefix: PathBuf,
    pub home: PathBuf,
    pub document_root: PathBuf,
    pub launcher_source: PathBuf,
}

impl InstallLayout {
    /// Resolve the layout from settings, falling back to the environment.
    pub fn resolve(settings: &Settings, env: &Environment) -> Result<Self, ProvisionError> {
        let prefix = settings
            .paths
            .prefix
            .clone()
            .or_else(|| env.prefix.as_ref().map(PathBuf::from))
            .ok_or_else(|| ProvisionError::Config {
                message: "install prefix unknown: set $PREFIX or paths.prefix".to_string(),
            })?;

        let home = settings
            .paths
            .home
            .clone()
            .or_else(|| env.home.clone())
            .ok_or_else(|| ProvisionError::Config {
                message: "home directory unknown: set paths.home".to_string(),
            })?;

        let document_root = settings
            .paths
            .document_root
            .clone()
            .unwrap_or_else(|| home.join("storage/shared/htdocs"));

        let launcher_source = settings
            .paths
            .launcher_source
            .clone()
            .unwrap_or_else(|| home.join("myserver/myserver"));

        for (name, path) in [
            ("prefix", &prefix),
            ("home", &home),
            ("document_root", &document_root),
        ] {
            if !path.is_absolute() {
                return Err(ProvisionError::Config {
                    message: format!("{} must be absolute: '{}'", name, path.display()),
                });
            }
        }

        Ok(Self {
            prefix,
            home,
            document_root,
            launcher_source,
        })
    }

    pub fn apache_dir(&self) -> PathBuf {
        self.prefix.join("etc/apache2")
    }

    pub fn server_config(&self) -> PathBuf {
        self.apache_dir().join("httpd.conf")
    }

    pub fn tls_vhost_config(&self) -> PathBuf {
        self.apache_dir().join("extra/httpd-ssl.conf")
    }

    pub fn certificate_path(&self) -> PathBuf {
        self.apache_dir().join("server.crt")
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.apache_dir().join("server.key")
    }

    /// Scratch directory for the openssl request config.
    pub fn scratch_dir(&self) -> PathBuf {
        self.apache_dir().join("tmp")
    }

    pub fn php_module(&self) -> PathBuf {
        self.prefix.join("libexec/apache2/libphp.so")
    }

    pub fn php_ini(&self) -> PathBuf {
        self.prefix.join("etc/php/php.ini")
    }

    pub fn directory_index_file(&self) -> PathBuf {
        self.document_root.join(".htaccess")
    }

    pub fn admin_ui_dir(&self) -> PathBuf {
        self.document_root.join("phpmyadmin")
    }

    pub fn admin_ui_config(&self) -> PathBuf {
        self.admin_ui_dir().join("config.inc.php")
    }

    pub fn admin_ui_sample_config(&self) -> PathBuf {
        self.admin_ui_dir().join("config.sample.inc.php")
    }

    pub fn launcher_destination(&self) -> PathBuf {
        self.prefix.join("bin/myserver")
    }

    /// Created by the storage setup tool once shared storage is linked.
    pub fn storage_marker(&self) -> PathBuf {
        self.home.join("storage")
    }

    pub fn default_journal(&self) -> PathBuf {
        self.prefix.join("var/log/myserver-setup.jsonl")
    }
}
