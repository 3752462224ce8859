//! Configuration settings for the provisioner.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

/// Main configuration structure.
///
/// Every section is optional in the TOML file; a missing file is equivalent
/// to `Settings::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub tls: TlsConfig,
    pub tools: ToolsConfig,
    pub packages: PackagesConfig,
    pub php: PhpConfig,
    pub patching: PatchingConfig,
    pub journal: JournalConfig,
}

/// Paths configuration.
///
/// Unset paths are derived from `$PREFIX` and the home directory when the
/// install layout is resolved.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Install prefix (Termux `$PREFIX`).
    pub prefix: Option<PathBuf>,
    /// Home directory.
    pub home: Option<PathBuf>,
    /// Web document root.
    pub document_root: Option<PathBuf>,
    /// Launcher script copied into `$PREFIX/bin`.
    pub launcher_source: Option<PathBuf>,
    /// Directory with `*.tera` files overriding the built-in templates.
    pub templates_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format ("compact", "pretty" or "json").
    pub format: String,
}

/// TLS virtual host and certificate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// HTTPS listen port.
    pub listen_port: u16,
    /// Certificate validity in days.
    pub days: u32,
    /// RSA key size.
    pub key_bits: u32,
    pub subject: SubjectConfig,
}

/// Distinguished name and subject alternative names for the certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
    pub common_name: String,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<String>,
}

/// External programs and their timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub openssl: String,
    pub package_manager: String,
    pub composer: String,
    pub storage_setup: String,
    /// Timeout for package manager and composer runs.
    pub package_timeout_seconds: u64,
    /// Timeout for short tool runs (openssl, storage setup).
    pub tool_timeout_seconds: u64,
}

/// Package manager step configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Packages installed in the install step.
    pub install: Vec<String>,
    /// Abort the pipeline when a package command exits non-zero.
    pub check_status: bool,
}

/// PHP runtime tuning written to php.ini.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhpConfig {
    pub upload_max_filesize: String,
    pub post_max_size: String,
    pub memory_limit: String,
    pub max_execution_time: u32,
    pub error_reporting: String,
    pub display_errors: bool,
}

/// Text patching policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatchingConfig {
    /// Treat unrecognized rules as a format error instead of a warning.
    pub strict: bool,
}

/// Run journal configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Whether step outcomes are appended to the journal.
    pub enabled: bool,
    /// Journal file. Defaults to `$PREFIX/var/log/myserver-setup.jsonl`.
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            listen_port: 8443,
            days: 365,
            key_bits: 2048,
            subject: SubjectConfig::default(),
        }
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            state: "California".to_string(),
            locality: "San Francisco".to_string(),
            organization: "My Organization".to_string(),
            organizational_unit: "IT Department".to_string(),
            common_name: "localhost".to_string(),
            dns_names: vec!["localhost".to_string(), "localhost.localdomain".to_string()],
            ip_addresses: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            openssl: "openssl".to_string(),
            package_manager: "pkg".to_string(),
            composer: "composer".to_string(),
            storage_setup: "termux-setup-storage".to_string(),
            package_timeout_seconds: 3600,
            tool_timeout_seconds: 120,
        }
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            install: ["php-apache", "openssl-tool", "mariadb", "composer", "wget"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            check_status: false,
        }
    }
}

impl Default for PhpConfig {
    fn default() -> Self {
        Self {
            upload_max_filesize: "2256M".to_string(),
            post_max_size: "256M".to_string(),
            memory_limit: "512M".to_string(),
            max_execution_time: 180,
            error_reporting: "E_ALL & ~E_DEPRECATED".to_string(),
            display_errors: true,
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ProvisionError::Config { message } => ProvisionError::Config {
                message: format!("{} ({})", message, path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ProvisionError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ProvisionError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ProvisionError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ProvisionError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.tls.listen_port == 0 {
            return Err(ProvisionError::Config {
                message: "tls.listen_port must be non-zero".to_string(),
            });
        }

        if self.tls.key_bits < 2048 {
            return Err(ProvisionError::Config {
                message: format!("tls.key_bits {} is below 2048", self.tls.key_bits),
            });
        }

        if self.tls.days == 0 {
            return Err(ProvisionError::Config {
                message: "tls.days must be non-zero".to_string(),
            });
        }

        if self.tls.subject.dns_names.is_empty() && self.tls.subject.ip_addresses.is_empty() {
            return Err(ProvisionError::Config {
                message: "tls.subject needs at least one DNS name or IP address".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.tls.listen_port, 8443);
        assert_eq!(settings.tls.days, 365);
        assert_eq!(settings.tls.key_bits, 2048);
        assert!(!settings.packages.check_status);
        assert!(!settings.patching.strict);
        assert!(settings.tls.subject.ip_addresses.contains(&"::1".to_string()));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.tools.openssl, "openssl");
        assert_eq!(settings.php.memory_limit, "512M");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            [paths]
            document_root = "/srv/www"

            [tls]
            listen_port = 9443

            [packages]
            check_status = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.paths.document_root, Some(PathBuf::from("/srv/www")));
        assert_eq!(settings.tls.listen_port, 9443);
        assert_eq!(settings.tls.days, 365);
        assert!(settings.packages.check_status);
        assert_eq!(settings.packages.install.len(), 5);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = Settings::from_toml("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_weak_key_rejected() {
        assert!(Settings::from_toml("[tls]\nkey_bits = 1024\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/myserver.toml").unwrap_err();
        assert!(matches!(err, ProvisionError::Config { .. }));
    }
}
