//! Progress reporting for pipeline runs.

use std::path::PathBuf;

use owo_colors::OwoColorize;

use super::report::{PipelineResult, StepOutcome};
use super::step::ProvisioningStep;

/// Receives pipeline events as they happen.
///
/// `ordinal` is 1-based. All methods default to doing nothing.
pub trait ProgressReporter {
    fn step_started(&mut self, _ordinal: usize, _total: usize, _step: &ProvisioningStep) {}

    fn step_finished(
        &mut self,
        _ordinal: usize,
        _total: usize,
        _step: &ProvisioningStep,
        _outcome: &StepOutcome,
    ) {
    }

    fn pipeline_finished(&mut self, _result: &PipelineResult) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {}

/// Forwards every event to each inner reporter in order.
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl ProgressReporter for FanoutReporter {
    fn step_started(&mut self, ordinal: usize, total: usize, step: &ProvisioningStep) {
        for r in &mut self.reporters {
            r.step_started(ordinal, total, step);
        }
    }

    fn step_finished(
        &mut self,
        ordinal: usize,
        total: usize,
        step: &ProvisioningStep,
        outcome: &StepOutcome,
    ) {
        for r in &mut self.reporters {
            r.step_finished(ordinal, total, step, outcome);
        }
    }

    fn pipeline_finished(&mut self, result: &PipelineResult) {
        for r in &mut self.reporters {
            r.pipeline_finished(result);
        }
    }
}

/// Where the finished server can be reached.
#[derive(Debug, Clone)]
pub struct ServerSummary {
    pub document_root: PathBuf,
    pub http_port: u16,
    pub https_port: u16,
    pub launcher: String,
}

/// Human-readable `[i/total]` progress on stdout.
pub struct ConsoleReporter {
    summary: ServerSummary,
}

impl ConsoleReporter {
    pub fn new(summary: ServerSummary) -> Self {
        Self { summary }
    }

    fn print_summary(&self) {
        let s = &self.summary;
        println!();
        println!("{}", "Setup completed successfully!".green().bold());
        println!("  Document root: {}", s.document_root.display().cyan());
        println!("  HTTP:  {}", format!("http://localhost:{}", s.http_port).cyan());
        println!("  HTTPS: {}", format!("https://localhost:{}", s.https_port).cyan());
        println!();
        println!("Type {} to start Server", s.launcher.bold());
    }
}

impl ProgressReporter for ConsoleReporter {
    fn step_started(&mut self, ordinal: usize, total: usize, step: &ProvisioningStep) {
        println!("{} {}", format!("[{}/{}]", ordinal, total).blue().bold(), step.name.bold());
    }

    fn step_finished(
        &mut self,
        _ordinal: usize,
        _total: usize,
        _step: &ProvisioningStep,
        outcome: &StepOutcome,
    ) {
        match outcome {
            StepOutcome::Performed { detail } => println!("  {}", detail.green()),
            StepOutcome::Skipped { reason } => println!("  {}", reason.yellow()),
            StepOutcome::Failed { reason } => println!("  {}", reason.red()),
        }
    }

    fn pipeline_finished(&mut self, result: &PipelineResult) {
        if result.succeeded() {
            self.print_summary();
        } else if let Some(step) = result.failed_step() {
            eprintln!(
                "{} step {} ({}) failed; fix the cause and run again",
                "[ERROR]".red().bold(),
                step.ordinal,
                step.name
            );
        }
    }
}
