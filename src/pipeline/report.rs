//! Step outcomes and the aggregate pipeline result.

use serde::Serialize;

/// Result of running one step.
///
/// `Performed` and `Skipped` are both success for sequencing; the split is
/// only for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Performed { detail: String },
    /// Already satisfied, or nothing applicable.
    Skipped { reason: String },
    Failed { reason: String },
}

impl StepOutcome {
    pub fn performed(detail: impl Into<String>) -> Self {
        Self::Performed {
            detail: detail.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Performed { .. } => "performed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Performed { detail } => detail,
            Self::Skipped { reason } | Self::Failed { reason } => reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    NotStarted,
    InProgress,
    Completed,
    Aborted,
}

/// Per-step entry of a [`PipelineResult`].
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based position in the pipeline.
    pub ordinal: usize,
    pub name: String,
    pub state: StepState,
    /// `None` for steps that never ran.
    pub outcome: Option<StepOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub state: PipelineState,
    pub steps: Vec<StepRecord>,
}

impl PipelineResult {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Completed
    }

    /// The step that aborted the run.
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.state == StepState::Failed)
    }

    pub fn performed_count(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Performed { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped { .. }))
    }

    /// Steps left `Pending` because an earlier one failed.
    pub fn not_run_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state == StepState::Pending)
            .count()
    }

    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome.as_ref().is_some_and(&pred))
            .count()
    }
}
