//! Running external tools.
//!
//! Programs are exec'd directly (no shell) with stdin closed. Captured
//! stdout and stderr are drained on helper threads while the child runs, so
//! a tool that writes more than a pipe buffer cannot stall, and a wall-clock
//! timeout kills anything that hangs.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{ProvisionError, ToolErrorKind};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit status and output of a finished tool.
#[derive(Debug, Clone)]
pub struct SubprocessResult {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Empty when output is discarded.
    pub stdout: String,
    pub stderr: String,
}

/// Describes one invocation of an external program.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Duration,
    discard_output: bool,
}

impl SubprocessBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            current_dir: None,
            timeout: Duration::from_secs(60),
            discard_output: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send stdout and stderr to /dev/null.
    ///
    /// Used for package managers, whose progress output is never shown.
    pub fn discard_output(mut self) -> Self {
        self.discard_output = true;
        self
    }

    /// Run to completion.
    ///
    /// A non-zero exit is reported through [`SubprocessResult::success`],
    /// not as an error; only spawn failures and timeouts are errors.
    pub fn run(self) -> Result<SubprocessResult, ProvisionError> {
        debug!(
            program = %self.program,
            args = ?self.args,
            cwd = ?self.current_dir,
            timeout_secs = self.timeout.as_secs(),
            "Running tool"
        );

        let output: fn() -> Stdio = if self.discard_output {
            Stdio::null
        } else {
            Stdio::piped
        };
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| self.spawn_error(e.to_string()))?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let start = Instant::now();
        let status = self.wait(&mut child, start)?;

        let result = SubprocessResult {
            success: status.success(),
            exit_code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        };
        debug!(
            program = %self.program,
            success = result.success,
            exit_code = ?result.exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tool finished"
        );
        Ok(result)
    }

    fn wait(&self, child: &mut Child, start: Instant) -> Result<ExitStatus, ProvisionError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if start.elapsed() > self.timeout => {
                    warn!(
                        program = %self.program,
                        timeout_secs = self.timeout.as_secs(),
                        "Tool timed out, killing"
                    );
                    if let Err(e) = child.kill() {
                        warn!(error = %e, "Failed to kill timed-out tool");
                    }
                    let _ = child.wait();
                    return Err(ProvisionError::ExternalTool {
                        kind: ToolErrorKind::Timeout {
                            program: self.program.clone(),
                            timeout_secs: self.timeout.as_secs(),
                        },
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.spawn_error(format!("failed to wait: {}", e))),
            }
        }
    }

    fn spawn_error(&self, message: String) -> ProvisionError {
        ProvisionError::ExternalTool {
            kind: ToolErrorKind::Spawn {
                program: self.program.clone(),
                message,
            },
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
