use crate::input::TestCase;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Harness-side failures while running one test case. A misbehaving target is
/// not an `ExecutionError`; that is reported through [`ExecutionStatus`].
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to stage test input to a transient file: {0}")]
    Stage(#[source] io::Error),
    #[error("failed to spawn target {target:?}: {source}")]
    Spawn {
        target: PathBuf,
        source: io::Error,
    },
    #[error("failed to write test input to target stdin: {0}")]
    StdinWrite(#[source] io::Error),
    #[error("failed while waiting for target: {0}")]
    Wait(#[source] io::Error),
    #[error("failed to kill timed-out target: {0}")]
    Kill(#[source] io::Error),
    #[error("failed to preserve failure artifact: {0}")]
    Preserve(#[from] tempfile::PersistError),
}

/// Outcome classification of one target run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Ok,
    /// Non-zero exit or signal termination. Informational: discovering these
    /// is the point of fuzzing.
    TargetFailure(String),
    /// The configured timeout fired and the target was killed.
    Timeout,
}

/// Everything captured from a single target run. Ownership passes to the
/// caller; the executor keeps nothing between iterations.
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub status: ExecutionStatus,
    pub duration: Duration,
    /// Path of the preserved staging file, present only when
    /// `preserve_failures` is set and the run failed.
    pub artifact: Option<PathBuf>,
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        !matches!(self.status, ExecutionStatus::Ok)
    }
}

pub struct CommandExecutorConfig {
    /// The target executable. Invoked with no command-line arguments; the
    /// test case arrives on its stdin.
    pub target: PathBuf,
    /// `None` (the default) blocks until the target exits on its own.
    pub timeout: Option<Duration>,
    /// Where staging files are created. Defaults to the system temp dir.
    pub artifact_dir: Option<PathBuf>,
    /// Keep the staging file of a failing run instead of deleting it.
    pub preserve_failures: bool,
}

impl CommandExecutorConfig {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            timeout: None,
            artifact_dir: None,
            preserve_failures: false,
        }
    }
}

pub struct CommandExecutor {
    config: CommandExecutorConfig,
}

impl CommandExecutor {
    pub fn new(config: CommandExecutorConfig) -> Self {
        Self { config }
    }

    /// Runs one test case against the target.
    ///
    /// The case is first written to a uniquely named transient file. That file
    /// is never handed to the target (input travels over stdin); it exists so
    /// a failing input can be inspected afterwards when `preserve_failures` is
    /// set. On every exit path, success or error, the file is removed unless
    /// that flag kept it.
    pub fn execute(&self, input: &TestCase) -> Result<ExecutionResult, ExecutionError> {
        let staged = self.stage_input(input)?;

        let start = Instant::now();
        let mut child = Command::new(&self.config.target)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                target: self.config.target.clone(),
                source,
            })?;

        let stdout_drain = drain(child.stdout.take());
        let stderr_drain = drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            // A target may exit without reading its stdin (closing the pipe);
            // that is target behavior, not a harness failure.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExecutionError::StdinWrite(e));
                }
            }
        }

        let exit = self.wait_for_exit(&mut child)?;
        let duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&stdout_drain.join().unwrap_or_default()).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_drain.join().unwrap_or_default()).into_owned();

        let (status, exit_code, signal) = match exit {
            Some(exit_status) => classify_exit(&exit_status),
            None => (ExecutionStatus::Timeout, None, None),
        };

        let artifact = if self.config.preserve_failures && status != ExecutionStatus::Ok {
            let (_file, path) = staged.keep()?;
            log::info!("preserved failing input at {path:?}");
            Some(path)
        } else {
            // Dropping `staged` removes the transient file.
            None
        };

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_code,
            signal,
            status,
            duration,
            artifact,
        })
    }

    fn stage_input(&self, input: &TestCase) -> Result<NamedTempFile, ExecutionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("rattle-").suffix(".input");
        let mut staged = match &self.config.artifact_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ExecutionError::Stage)?;
        staged
            .write_all(input.as_bytes())
            .map_err(ExecutionError::Stage)?;
        Ok(staged)
    }

    /// `Ok(Some(status))` once the target exits, `Ok(None)` when the timeout
    /// fired and the target was killed and reaped.
    fn wait_for_exit(&self, child: &mut Child) -> Result<Option<ExitStatus>, ExecutionError> {
        let Some(timeout) = self.config.timeout else {
            return child.wait().map(Some).map_err(ExecutionError::Wait);
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        log::warn!("target timed out after {timeout:?}, killing");
                        child.kill().map_err(ExecutionError::Kill)?;
                        let _ = child.wait();
                        return Ok(None);
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(ExecutionError::Wait(e)),
            }
        }
    }
}

fn drain<S: Read + Send + 'static>(stream: Option<S>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn classify_exit(exit: &ExitStatus) -> (ExecutionStatus, Option<i32>, Option<i32>) {
    let exit_code = exit.code();
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        exit.signal()
    };
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    let status = if exit.success() {
        ExecutionStatus::Ok
    } else if let Some(code) = exit_code {
        ExecutionStatus::TargetFailure(format!("exited with code {code}"))
    } else if let Some(signal) = signal {
        ExecutionStatus::TargetFailure(format!("terminated by signal {signal}"))
    } else {
        ExecutionStatus::TargetFailure("exited abnormally".to_string())
    };
    (status, exit_code, signal)
}
