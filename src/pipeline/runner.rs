//! Sequential, fail-fast pipeline runner.

use tracing::{error, info, info_span, warn};

use crate::error::ProvisionResult;

use super::progress::ProgressReporter;
use super::report::{PipelineResult, PipelineState, StepOutcome, StepRecord, StepState};
use super::step::ProvisioningStep;

/// Performs a single step.
///
/// Errors are turned into [`StepOutcome::Failed`] by the runner, so an
/// implementation only returns `Failed` itself for failures that are not
/// an error of any component.
pub trait StepExecutor {
    fn execute(&mut self, step: &ProvisioningStep) -> ProvisionResult<StepOutcome>;
}

/// An ordered list of steps run strictly in sequence.
#[derive(Debug, Clone)]
pub struct StepPipeline {
    steps: Vec<ProvisioningStep>,
}

impl StepPipeline {
    pub fn new(steps: Vec<ProvisioningStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ProvisioningStep] {
        &self.steps
    }

    /// Run every step once, in order, stopping at the first failure.
    ///
    /// Steps after a failure stay `Pending`. Nothing is rolled back: every
    /// step is idempotent, so re-running the whole pipeline is the recovery
    /// path.
    pub fn run(
        &self,
        executor: &mut dyn StepExecutor,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult {
        let total = self.steps.len();
        let mut result = PipelineResult {
            state: PipelineState::NotStarted,
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(i, step)| StepRecord {
                    ordinal: i + 1,
                    name: step.name.clone(),
                    state: StepState::Pending,
                    outcome: None,
                })
                .collect(),
        };

        result.state = PipelineState::InProgress;
        info!(steps = total, "Provisioning started");

        for (i, step) in self.steps.iter().enumerate() {
            let ordinal = i + 1;
            let _span = info_span!("step", ordinal, name = %step.name).entered();

            result.steps[i].state = StepState::Running;
            reporter.step_started(ordinal, total, step);

            let outcome = match executor.execute(step) {
                Ok(outcome) => outcome,
                Err(e) => StepOutcome::failed(e.to_string()),
            };

            let succeeded = outcome.is_success();
            match &outcome {
                StepOutcome::Performed { detail } => info!(detail = %detail, "Step performed"),
                StepOutcome::Skipped { reason } => info!(reason = %reason, "Step skipped"),
                StepOutcome::Failed { reason } => error!(reason = %reason, "Step failed"),
            }

            reporter.step_finished(ordinal, total, step, &outcome);
            result.steps[i].state = if succeeded {
                StepState::Succeeded
            } else {
                StepState::Failed
            };
            result.steps[i].outcome = Some(outcome);

            if !succeeded {
                result.state = PipelineState::Aborted;
                warn!(
                    not_run = total - ordinal,
                    "Provisioning aborted, remaining steps not run"
                );
                reporter.pipeline_finished(&result);
                return result;
            }
        }

        result.state = PipelineState::Completed;
        info!(
            performed = result.performed_count(),
            skipped = result.skipped_count(),
            "Provisioning completed"
        );
        reporter.pipeline_finished(&result);
        result
    }
}
