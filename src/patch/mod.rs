//! Idempotent text patching of configuration files.
//!
//! A [`DesiredState`] is an ordered table of [`RewriteRule`]s plus
//! append-if-absent [`AppendBlock`]s. [`apply`] is a pure function over the
//! text; [`ManagedFile::patch`] adds the read, backup and atomic write
//! around it. Running either twice is a no-op the second time.

mod file;
mod patcher;
mod rule;

pub use file::{FilePatchReport, ManagedFile, PatchPolicy};
pub use patcher::{apply, BlockReport, PatchOutcome, RuleReport, RuleStatus};
pub use rule::{AppendBlock, DesiredState, Replacement, RewriteRule};
