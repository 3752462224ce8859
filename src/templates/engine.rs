//! Rendering of fully managed files through Tera.

use std::path::Path;
use std::sync::Arc;

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::ProvisionError;

use super::builtin;

/// Built-in templates, optionally shadowed by files from a user directory.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    /// Create an engine holding only the built-in templates.
    pub fn builtin() -> Result<Self, ProvisionError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(builtin::all())
            .map_err(|e| ProvisionError::Template {
                message: format!("Failed to load built-in templates: {}", e),
            })?;

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Create an engine where `*.tera` files under `template_dir` replace
    /// the built-in templates of the same name.
    ///
    /// Templates are loaded recursively; names are relative to the directory
    /// (e.g. `apache/httpd-ssl.conf.tera`).
    pub fn with_overrides(template_dir: &Path) -> Result<Self, ProvisionError> {
        let pattern = template_dir.join("**/*.tera");
        let pattern_str = pattern.to_string_lossy();

        debug!(pattern = %pattern_str, "Loading template overrides");

        let mut tera = Tera::new(&pattern_str).map_err(|e| ProvisionError::Template {
            message: format!(
                "Failed to load templates from '{}': {}",
                template_dir.display(),
                e
            ),
        })?;

        let overrides = tera.get_template_names().count();
        let defaults = Self::builtin()?;
        // extend() never replaces templates already present, so overrides win.
        tera.extend(&defaults.tera)
            .map_err(|e| ProvisionError::Template {
                message: format!("Failed to merge built-in templates: {}", e),
            })?;

        info!(
            directory = %template_dir.display(),
            overrides,
            "Template engine initialized"
        );

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render `name`; `context` must serialize to a JSON object.
    pub fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, ProvisionError> {
        let ctx = Context::from_serialize(context).map_err(|e| ProvisionError::Template {
            message: format!("context for '{}' is not an object: {}", name, e),
        })?;

        self.tera.render(name, &ctx).map_err(|e| ProvisionError::Template {
            message: format!("cannot render '{}': {}", name, e),
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}
