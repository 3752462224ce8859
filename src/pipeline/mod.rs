//! Ordered provisioning pipeline.
//!
//! A [`StepPipeline`] runs [`ProvisioningStep`]s one at a time against a
//! [`StepExecutor`] (normally a [`ProvisionContext`]) and aborts at the
//! first failure. Progress is pushed to a [`ProgressReporter`].

mod context;
mod progress;
mod report;
mod runner;
mod step;

pub use context::ProvisionContext;
pub use progress::{ConsoleReporter, FanoutReporter, NullReporter, ProgressReporter, ServerSummary};
pub use report::{PipelineResult, PipelineState, StepOutcome, StepRecord, StepState};
pub use runner::{StepExecutor, StepPipeline};
pub use step::{default_steps, CommandLine, GeneratedFile, ManagedConfig, ProvisioningStep, StepAction};
