//! Configuration module for the provisioner.
//!
//! Loads settings from an optional TOML file and resolves them, together
//! with a snapshot of the process environment, into an [`InstallLayout`].

mod layout;
mod settings;

pub use layout::*;
pub use settings::*;
