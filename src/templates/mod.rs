//! Templates for files this tool owns outright (TLS virtual host,
//! directory index, php.ini, openssl request config).

pub mod builtin;
mod engine;

pub use engine::TemplateEngine;
