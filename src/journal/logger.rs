//! JSON-lines run journal.
//!
//! Every finished step and the final pipeline state are appended as one
//! JSON object per line, so past runs can be inspected with line-oriented
//! tools.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ProvisionError, ProvisionResult};
use crate::pipeline::{PipelineResult, ProgressReporter, ProvisioningStep, StepOutcome};

use super::entry::{JournalEntry, JournalEvent};

/// Appends journal entries to a file.
pub struct JournalWriter {
    file: File,
    path: PathBuf,
}

impl JournalWriter {
    /// Open `path` for appending, creating it and its parent as needed.
    pub fn open(path: &Path) -> ProvisionResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!(path = %parent.display(), "Creating journal directory");
                std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProvisionError::io(path, e))?;

        debug!(path = %path.display(), "Journal opened");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn write(&mut self, entry: &JournalEntry) -> ProvisionResult<()> {
        let json = serde_json::to_string(entry)?;
        writeln!(self.file, "{}", json).map_err(|e| ProvisionError::io(&self.path, e))?;

        if let Err(e) = self.file.sync_data() {
            warn!(error = %e, "Failed to sync journal");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Records pipeline events in the journal.
///
/// Write failures are logged and otherwise ignored; the journal never
/// affects the outcome of a run.
pub struct JournalReporter {
    writer: JournalWriter,
    run_id: Uuid,
    step_started: Option<Instant>,
}

impl JournalReporter {
    pub fn new(writer: JournalWriter) -> Self {
        Self {
            writer,
            run_id: Uuid::new_v4(),
            step_started: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn record(&mut self, event: JournalEvent) {
        let entry = JournalEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: self.run_id,
            event,
        };
        if let Err(e) = self.writer.write(&entry) {
            warn!(
                path = %self.writer.path().display(),
                error = %e,
                "Failed to write journal entry"
            );
        }
    }
}

impl ProgressReporter for JournalReporter {
    fn step_started(&mut self, _ordinal: usize, _total: usize, _step: &ProvisioningStep) {
        self.step_started = Some(Instant::now());
    }

    fn step_finished(
        &mut self,
        ordinal: usize,
        total: usize,
        step: &ProvisioningStep,
        outcome: &StepOutcome,
    ) {
        let duration_ms = self
            .step_started
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.record(JournalEvent::step(ordinal, total, &step.name, outcome, duration_ms));
    }

    fn pipeline_finished(&mut self, result: &PipelineResult) {
        self.record(JournalEvent::Finished {
            state: result.state,
            performed: result.performed_count(),
            skipped: result.skipped_count(),
            not_run: result.not_run_count(),
        });
    }
}
