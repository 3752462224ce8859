//! Run journal.
//!
//! Appends what each provisioning run did to a JSON-lines file.

mod entry;
mod logger;

pub use entry::{JournalEntry, JournalEvent};
pub use logger::{JournalReporter, JournalWriter};
