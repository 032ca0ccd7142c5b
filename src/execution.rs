//! Simulator invocation and per-case results

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::comparison::CaseComparison;
use crate::config::SuiteConfig;
use crate::discovery::TestCase;

/// Status of a completed test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// The simulator ran successfully and every expected artifact matched
    Passed,
    /// The simulator failed, or at least one artifact comparison failed
    Failed,
    /// The simulator exceeded the configured timeout (counts as failed)
    Timeout,
}

/// What one simulator invocation did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Process exit code; `None` when the process was killed by a signal,
    /// timed out, or never launched
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
    /// Launch failure description (binary missing, spawn error)
    pub launch_error: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && self.launch_error.is_none()
    }

    /// Diagnostic text for a failed run
    pub fn failure_detail(&self) -> String {
        if let Some(err) = &self.launch_error {
            return err.clone();
        }
        if self.timed_out {
            return format!("timed out after {:.2?}", self.duration);
        }
        match self.exit_code {
            Some(code) => format!("exit code {}: {}", code, self.stderr.trim()),
            None => format!("killed by signal: {}", self.stderr.trim()),
        }
    }

    fn launch_failed(error: String) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            timed_out: false,
            launch_error: Some(error),
        }
    }
}

/// Result of running one test case end to end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: TestCase,
    pub status: CaseStatus,
    /// Why the case failed, `None` for a pass
    pub failure: Option<String>,
    /// Simulator run details
    pub run: RunOutcome,
    /// Per-file comparison results; `None` when comparison was skipped
    /// because the simulator run already failed
    pub comparison: Option<CaseComparison>,
    pub duration: Duration,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Runs the external simulator for one test case at a time.
///
/// The child's working directory is set to the case directory for each
/// invocation; the harness's own current directory is never touched, so
/// concurrent cases cannot interfere with each other.
#[derive(Clone)]
pub struct SimulatorRunner {
    /// Canonicalized so a relative `--simulator` path survives the per-case
    /// working-directory change
    simulator: PathBuf,
    extra_args: Vec<String>,
    input_name: String,
    timeout_secs: u64,
}

impl SimulatorRunner {
    pub fn new(config: &SuiteConfig) -> Result<Self, crate::TestError> {
        let simulator = config.simulator.canonicalize().map_err(|e| {
            crate::TestError::Config(format!(
                "Cannot resolve simulator path {}: {}",
                config.simulator.display(),
                e
            ))
        })?;

        Ok(Self {
            simulator,
            extra_args: config.extra_simulator_args()?,
            input_name: config.input_name.clone(),
            timeout_secs: config.timeout,
        })
    }

    /// Invoke `<simulator> [extra args] <input>` inside the case directory,
    /// blocking until the process exits (or the timeout expires).
    ///
    /// Failure is a normal outcome communicated through the result value;
    /// this only errs for harness-level problems, never for the simulator's.
    pub async fn run(&self, case: &TestCase) -> RunOutcome {
        let start = Instant::now();

        let mut cmd = Command::new(&self.simulator);
        cmd.args(&self.extra_args)
            .arg(&self.input_name)
            .current_dir(&case.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Case {}: running {} {} in {}",
            case.name,
            self.simulator.display(),
            self.input_name,
            case.path.display()
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return RunOutcome::launch_failed(format!(
                    "failed to launch {}: {}",
                    self.simulator.display(),
                    e
                ))
            }
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let wait = async {
            // Drain both pipes concurrently before waiting: a chatty
            // simulator must not block on a full pipe.
            tokio::join!(
                async {
                    if let Some(pipe) = stdout_pipe.as_mut() {
                        let _ = pipe.read_to_end(&mut stdout).await;
                    }
                },
                async {
                    if let Some(pipe) = stderr_pipe.as_mut() {
                        let _ = pipe.read_to_end(&mut stderr).await;
                    }
                }
            );
            child.wait().await
        };

        let status = if self.timeout_secs == 0 {
            wait.await
        } else {
            // Bound to a local so the timed-out future (and its borrows of
            // the child) is dropped before the kill below.
            let waited = timeout(Duration::from_secs(self.timeout_secs), wait).await;
            match waited {
                Ok(status) => status,
                Err(_) => {
                    // Kill and reap before returning so the workspace
                    // cleaner never races a dying simulator.
                    let _ = child.kill().await;
                    return RunOutcome {
                        exit_code: None,
                        stdout: String::from_utf8_lossy(&stdout).to_string(),
                        stderr: String::from_utf8_lossy(&stderr).to_string(),
                        duration: start.elapsed(),
                        timed_out: true,
                        launch_error: None,
                    };
                }
            }
        };

        match status {
            Ok(status) => RunOutcome {
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).to_string(),
                stderr: String::from_utf8_lossy(&stderr).to_string(),
                duration: start.elapsed(),
                timed_out: false,
                launch_error: None,
            },
            Err(e) => RunOutcome::launch_failed(format!("failed to collect output: {}", e)),
        }
    }
}
