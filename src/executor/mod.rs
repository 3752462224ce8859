//! Command executor module.
//!
//! Handles subprocess spawning, execution timeouts and output shaping.

mod output;
mod subprocess;

pub use output::tail_excerpt;
pub use subprocess::{SubprocessBuilder, SubprocessResult};
