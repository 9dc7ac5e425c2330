//! Subprocess execution for model backends.
//!
//! The `CommandRunner` trait keeps every process adapter testable without
//! external binaries.

use crate::error::{Result, VoxbridgeError};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Trait for running a model command.
///
/// Object-safe, Send + Sync for use from the blocking pool.
pub trait CommandRunner: Send + Sync {
    /// Run `argv`, feed `stdin` to it, and return its stdout.
    ///
    /// `stage` names the pipeline stage in any error raised. A command still
    /// running after `timeout` is killed along with anything it spawned.
    fn run(
        &self,
        stage: &str,
        argv: &[String],
        stdin: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>>;
}

/// Production runner using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        stage: &str,
        argv: &[String],
        stdin: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let (program, args) = argv.split_first().ok_or_else(|| VoxbridgeError::BackendUnavailable {
            stage: stage.to_string(),
            message: "no command configured".to_string(),
        })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a kill reaches helpers the command forks
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxbridgeError::BackendUnavailable {
                    stage: stage.to_string(),
                    message: format!("{} not found", program),
                }
            } else {
                VoxbridgeError::backend(stage, format!("Failed to execute {}: {}", program, e))
            }
        })?;

        // Feed stdin and drain both output pipes on their own threads so a
        // chatty child cannot deadlock on a full pipe.
        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_vec();
            thread::spawn(move || pipe.write_all(&input))
        });
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let status = match wait_until(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let limit_ms = timeout.map(|t| t.as_millis()).unwrap_or_default();
                kill_process_group(&mut child);
                tracing::warn!(stage, program, timeout_ms = limit_ms as u64, "Command timed out, killed");
                return Err(VoxbridgeError::backend(
                    stage,
                    format!("{} timed out after {}ms", program, limit_ms),
                ));
            }
            Err(e) => {
                kill_process_group(&mut child);
                return Err(VoxbridgeError::backend(
                    stage,
                    format!("Failed to wait for {}: {}", program, e),
                ));
            }
        };

        let stdout = stdout_rx.recv().unwrap_or_default();
        let stderr = stderr_rx.recv().unwrap_or_default();

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The child may legitimately exit without reading all input
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(VoxbridgeError::backend(
                        stage,
                        format!("Failed to write to {}: {}", program, e),
                    ));
                }
                Err(_) => {
                    return Err(VoxbridgeError::backend(
                        stage,
                        format!("stdin writer for {} panicked", program),
                    ));
                }
            }
        }

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(VoxbridgeError::backend(
                stage,
                format!("{} failed with status {:?}: {}", program, status, stderr.trim()),
            ));
        }

        tracing::trace!(stage, program, bytes = stdout.len(), "Command finished");
        Ok(stdout)
    }
}

/// Read a pipe to its end on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                tracing::debug!(error = %e, "Failed to read command output");
            }
            tx.send(buf).ok();
        });
    }
    rx
}

/// Wait for exit. `Ok(None)` means the deadline passed first.
fn wait_until(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        // SAFETY: kill(2) has no memory-safety preconditions. The child leads
        // its own group, so the negated pid addresses only its processes.
        let pgid = child.id() as libc::pid_t;
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "Child already exited before kill");
    }
    if let Err(e) = child.wait() {
        tracing::debug!(error = %e, "Failed to reap killed child");
    }
}

/// Replace `{name}` placeholders in each argument.
pub fn expand_args(argv: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{}}}", name), value)
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records invocations and replies with canned stdout.
    #[derive(Clone, Default)]
    pub struct MockCommandRunner {
        pub calls: Arc<Mutex<Vec<(Vec<String>, Vec<u8>)>>>,
        pub timeouts: Arc<Mutex<Vec<Option<Duration>>>>,
        pub stdout: Vec<u8>,
        pub fail: bool,
    }

    impl MockCommandRunner {
        pub fn replying(stdout: &[u8]) -> Self {
            Self {
                stdout: stdout.to_vec(),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<(Vec<String>, Vec<u8>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn timeouts(&self) -> Vec<Option<Duration>> {
            self.timeouts.lock().unwrap().clone()
        }
    }

    impl CommandRunner for MockCommandRunner {
        fn run(
            &self,
            stage: &str,
            argv: &[String],
            stdin: &[u8],
            timeout: Option<Duration>,
        ) -> Result<Vec<u8>> {
            self.calls
                .lock()
                .unwrap()
                .push((argv.to_vec(), stdin.to_vec()));
            self.timeouts.lock().unwrap().push(timeout);
            if self.fail {
                return Err(VoxbridgeError::backend(stage, "mock command failure"));
            }
            Ok(self.stdout.clone())
        }
    }
}
