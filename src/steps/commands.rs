//! Package manager and other host commands.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ProvisionError, ProvisionResult, ToolErrorKind};
use crate::executor::SubprocessBuilder;
use crate::pipeline::{CommandLine, ProvisionContext, StepOutcome};

/// Run each command with output discarded.
///
/// With `check_status` unset, a non-zero exit or a program that cannot be
/// started is logged and the remaining commands still run.
pub fn run_commands(
    ctx: &ProvisionContext,
    commands: &[CommandLine],
    check_status: bool,
) -> ProvisionResult<StepOutcome> {
    let mut unchecked_failures = 0;

    for command in commands {
        match run_discarding(command, ctx.package_timeout()) {
            Ok(()) => info!(command = %command, "Command finished"),
            Err(e) if check_status => return Err(e),
            Err(e) => {
                unchecked_failures += 1;
                warn!(command = %command, error = %e, "Command failed, continuing");
            }
        }
    }

    let detail = if unchecked_failures == 0 {
        format!("Ran {} command(s)", commands.len())
    } else {
        format!(
            "Ran {} command(s), {} failed (status not checked)",
            commands.len(),
            unchecked_failures
        )
    };
    Ok(StepOutcome::performed(detail))
}

/// Ask the storage setup tool to link shared storage into the home dir.
pub fn ensure_storage(ctx: &ProvisionContext) -> ProvisionResult<StepOutcome> {
    let marker = ctx.layout.storage_marker();
    if marker.exists() {
        return Ok(StepOutcome::skipped("Storage settings already exist"));
    }

    let command = CommandLine::new(&ctx.tools.storage_setup, Vec::<String>::new());
    if let Err(e) = run_discarding(&command, ctx.tool_timeout()) {
        warn!(command = %command, error = %e, "Storage setup failed, continuing");
        return Ok(StepOutcome::performed(format!(
            "Storage setup requested but {} reported a failure",
            command.program
        )));
    }
    Ok(StepOutcome::performed("Storage access requested"))
}

fn run_discarding(command: &CommandLine, timeout: Duration) -> ProvisionResult<()> {
    let result = SubprocessBuilder::new(&command.program)
        .args(command.args.iter().map(String::as_str))
        .timeout(timeout)
        .discard_output()
        .run()?;

    if !result.success {
        return Err(ProvisionError::ExternalTool {
            kind: ToolErrorKind::NonZeroExit {
                program: command.program.clone(),
                code: result.exit_code,
                stderr: String::new(),
            },
        });
    }
    Ok(())
}
