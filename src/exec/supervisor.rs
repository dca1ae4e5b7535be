// src/exec/supervisor.rs

//! The command supervisor.
//!
//! One `run` call owns one child process from spawn to reap:
//!
//! - two reader tasks drain stdout and stderr into per-stream queues;
//! - a coordinating loop ticks every `poll_interval`, moves whatever is queued
//!   to the sink and the aggregates, and checks exit status and timeout;
//! - on timeout the child is killed and nothing further is read.
//!
//! Ordering within one stream follows emission order. Ordering between the
//! two streams is only as fine as the poll tick: stdout lines of a tick are
//! forwarded before stderr lines of the same tick.

use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::config::SupervisorSection;
use crate::errors::SupervisorError;
use crate::exec::reader::spawn_reader;
use crate::exec::{ConsoleSink, ExecutionResult, Invocation, OutputLine, OutputSink, StreamKind};

/// Default coordinator tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long readers may take to notice a killed child before being aborted.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Environment hint that makes Python (and tools honouring it) flush lines
/// promptly when stdout is a pipe.
pub const UNBUFFERED_ENV: (&str, &str) = ("PYTHONUNBUFFERED", "1");

/// Shell used to interpret command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: String,
    pub flag: String,
}

impl Shell {
    /// `cmd /C` on Windows, `sh -c` elsewhere.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("sh", "-c")
        }
    }

    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    fn command(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if !self.flag.is_empty() {
            cmd.arg(&self.flag);
        }
        cmd.arg(line);
        cmd
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::host()
    }
}

/// Runs external commands one at a time with live output and a timeout.
///
/// A `Supervisor` holds no per-invocation state; every `run` call is fully
/// parameterized by its [`Invocation`].
pub struct Supervisor {
    shell: Shell,
    env: BTreeMap<String, String>,
    poll_interval: Duration,
    sink: Box<dyn OutputSink>,
}

impl Supervisor {
    /// Host shell, console sink, 100 ms tick, `PYTHONUNBUFFERED=1`.
    pub fn new() -> Self {
        let mut env = BTreeMap::new();
        env.insert(UNBUFFERED_ENV.0.to_string(), UNBUFFERED_ENV.1.to_string());

        Self {
            shell: Shell::host(),
            env,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sink: Box::new(ConsoleSink),
        }
    }

    /// Supervisor configured from `[supervisor]`, printing to the console.
    pub fn from_config(cfg: &SupervisorSection) -> Self {
        let mut supervisor = Self::new()
            .with_env(cfg.env.clone())
            .with_poll_interval(cfg.poll_interval());

        if let Some([program, rest @ ..]) = cfg.shell.as_deref() {
            let flag = rest.first().cloned().unwrap_or_default();
            supervisor = supervisor.with_shell(Shell::new(program.clone(), flag));
        }
        supervisor
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Add variables injected into every child. Later values win, so the
    /// unbuffered hint can be overridden but not dropped.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Run `invocation` to completion or timeout.
    ///
    /// Returns `Err` for the fatal conditions: spawn failure, timeout, and a
    /// nonzero exit when `fail_fast` is set. A nonzero exit without fail-fast
    /// comes back as `Ok` with the code in the result.
    pub async fn run(
        &mut self,
        invocation: &Invocation,
    ) -> Result<ExecutionResult, SupervisorError> {
        self.sink.started(invocation);
        debug!(
            description = %invocation.description,
            cmd = %invocation.command,
            fail_fast = invocation.fail_fast,
            timeout_secs = invocation.timeout.as_secs(),
            "starting command"
        );

        let mut cmd = self.shell.command(&invocation.command);
        cmd.envs(&self.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| {
            error!(description = %invocation.description, error = %source, "failed to spawn command");
            SupervisorError::Spawn {
                description: invocation.description.clone(),
                command: invocation.command.clone(),
                source,
            }
        })?;
        debug!(pid = ?child.id(), "child spawned");

        let clock = Arc::new(AtomicU64::new(0));
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let readers = Readers {
            stdout: spawn_reader(
                StreamKind::Stdout,
                child.stdout.take(),
                Arc::clone(&clock),
                stdout_tx,
            ),
            stderr: spawn_reader(StreamKind::Stderr, child.stderr.take(), clock, stderr_tx),
        };

        let mut run = ActiveRun {
            stdout_rx,
            stderr_rx,
            stdout: String::new(),
            stderr: String::new(),
        };

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut status: Option<ExitStatus> = None;
        loop {
            run.drain(self.sink.as_mut());

            if status.is_none() {
                status = child.try_wait().map_err(|source| SupervisorError::Wait {
                    description: invocation.description.clone(),
                    source,
                })?;
            }

            if status.is_some() && readers.finished() {
                break;
            }

            if started.elapsed() > invocation.timeout {
                return Err(kill_on_timeout(invocation, child, readers, run, started).await);
            }

            ticker.tick().await;
        }

        // Both readers are done, so every line they produced is queued.
        run.drain(self.sink.as_mut());
        readers.join().await;

        let code = exit_code(status);
        let result = ExecutionResult {
            stdout: run.stdout,
            stderr: run.stderr,
            exit_code: code,
            timed_out: false,
            elapsed: started.elapsed(),
        };

        debug!(
            description = %invocation.description,
            exit_code = code,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "command exited"
        );

        if invocation.fail_fast && code != 0 {
            error!(description = %invocation.description, exit_code = code, "command failed");
            self.sink.failed(invocation, &result);
            return Err(SupervisorError::NonZeroExit {
                description: invocation.description.clone(),
                code,
                result,
            });
        }

        self.sink.finished(invocation, &result);
        Ok(result)
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Queues and aggregates of the invocation in flight.
struct ActiveRun {
    stdout_rx: mpsc::UnboundedReceiver<OutputLine>,
    stderr_rx: mpsc::UnboundedReceiver<OutputLine>,
    stdout: String,
    stderr: String,
}

impl ActiveRun {
    /// Move everything queued right now to the sink and the aggregates.
    fn drain(&mut self, sink: &mut dyn OutputSink) {
        while let Ok(line) = self.stdout_rx.try_recv() {
            sink.line(&line);
            self.stdout.push_str(&line.text);
        }
        while let Ok(line) = self.stderr_rx.try_recv() {
            sink.line(&line);
            self.stderr.push_str(&line.text);
        }
    }
}

struct Readers {
    stdout: JoinHandle<()>,
    stderr: JoinHandle<()>,
}

impl Readers {
    fn finished(&self) -> bool {
        self.stdout.is_finished() && self.stderr.is_finished()
    }

    async fn join(self) {
        for (stream, handle) in [(StreamKind::Stdout, self.stdout), (StreamKind::Stderr, self.stderr)] {
            if let Err(err) = handle.await {
                warn!(%stream, error = %err, "reader task did not finish cleanly");
            }
        }
    }

    /// Give readers a short window to see the closed pipes, then abort them.
    ///
    /// A grandchild that inherited a pipe can keep it open after the shell is
    /// killed; such a reader is abandoned rather than awaited.
    async fn abandon(self) {
        for (stream, mut handle) in [(StreamKind::Stdout, self.stdout), (StreamKind::Stderr, self.stderr)] {
            if tokio::time::timeout(READER_GRACE, &mut handle).await.is_err() {
                debug!(%stream, "reader still blocked after kill; aborting it");
                handle.abort();
            }
        }
    }
}

/// Kill a timed-out child and build the error carrying its partial output.
async fn kill_on_timeout(
    invocation: &Invocation,
    mut child: Child,
    readers: Readers,
    run: ActiveRun,
    started: Instant,
) -> SupervisorError {
    error!(
        description = %invocation.description,
        timeout_secs = invocation.timeout.as_secs(),
        "command exceeded its timeout; killing process"
    );

    // kill() also reaps the child.
    if let Err(err) = child.kill().await {
        warn!(error = %err, "failed to kill timed-out process");
    }
    drop(child);

    // Output produced after the kill decision is not read.
    let ActiveRun { stdout, stderr, .. } = run;
    readers.abandon().await;

    SupervisorError::Timeout {
        description: invocation.description.clone(),
        timeout: invocation.timeout,
        partial: ExecutionResult {
            stdout,
            stderr,
            exit_code: -1,
            timed_out: true,
            elapsed: started.elapsed(),
        },
    }
}

fn exit_code(status: Option<ExitStatus>) -> i32 {
    status.and_then(|s| s.code()).unwrap_or(-1)
}
