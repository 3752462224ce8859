//! MyServer Setup Library
//!
//! Provisions an Apache + PHP + phpMyAdmin web stack with TLS on Termux by
//! patching the vendor configuration files in place. Every step is
//! idempotent, so running the provisioner again is always safe.

pub mod assembler;
pub mod certs;
pub mod config;
pub mod error;
pub mod executor;
pub mod fs;
pub mod journal;
pub mod patch;
pub mod pipeline;
pub mod steps;
pub mod templates;
