//! Journal entry types.

use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::{PipelineState, StepOutcome};

/// One line of the run journal.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Shared by every entry of one invocation.
    pub run_id: Uuid,
    #[serde(flatten)]
    pub event: JournalEvent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    Step {
        ordinal: usize,
        total: usize,
        name: String,
        /// `performed`, `skipped` or `failed`.
        outcome: &'static str,
        message: String,
        duration_ms: u64,
    },
    Finished {
        state: PipelineState,
        performed: usize,
        skipped: usize,
        not_run: usize,
    },
}

impl JournalEvent {
    pub fn step(
        ordinal: usize,
        total: usize,
        name: &str,
        outcome: &StepOutcome,
        duration_ms: u64,
    ) -> Self {
        Self::Step {
            ordinal,
            total,
            name: name.to_string(),
            outcome: outcome.kind(),
            message: outcome.message().to_string(),
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_entry_serialization() {
        let entry = JournalEntry {
            timestamp: "2026-01-15T10:30:45.123+00:00".to_string(),
            run_id: Uuid::nil(),
            event: JournalEvent::step(
                4,
                12,
                "TLS certificate",
                &StepOutcome::skipped("already present"),
                3,
            ),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"], "step");
        assert_eq!(json["ordinal"], 4);
        assert_eq!(json["name"], "TLS certificate");
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["message"], "already present");
        assert_eq!(json["run_id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_finished_entry_serialization() {
        let entry = JournalEntry {
            timestamp: "2026-01-15T10:30:45.123+00:00".to_string(),
            run_id: Uuid::nil(),
            event: JournalEvent::Finished {
                state: PipelineState::Aborted,
                performed: 3,
                skipped: 1,
                not_run: 7,
            },
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"], "finished");
        assert_eq!(json["state"], "aborted");
        assert_eq!(json["not_run"], 7);
    }
}
