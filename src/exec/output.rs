// src/exec/output.rs

//! Output types produced by the supervisor, plus the sink that mirrors
//! process output to the console while it is being captured.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::exec::Invocation;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// A single line read from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,

    /// Logical arrival time, shared across both streams of one invocation.
    pub seq: u64,

    /// Raw line text, including its terminator when the child wrote one.
    pub text: String,
}

impl OutputLine {
    /// Line text without the trailing `\n` / `\r\n`.
    pub fn trimmed(&self) -> &str {
        self.text.trim_end_matches(['\n', '\r'])
    }
}

/// Outcome of one supervised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Every stdout line, concatenated in emission order.
    pub stdout: String,

    /// Every stderr line, concatenated in emission order.
    pub stderr: String,

    /// Process exit code; `-1` when the process ended without one (signal).
    pub exit_code: i32,

    /// True when the process was killed for exceeding its timeout.
    pub timed_out: bool,

    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// First non-empty trimmed text of stdout, falling back to stderr.
    ///
    /// Version probes like `python --version` print to either stream depending
    /// on the interpreter release.
    pub fn first_output(&self) -> &str {
        let out = self.stdout.trim();
        if out.is_empty() {
            self.stderr.trim()
        } else {
            out
        }
    }
}

/// Receives the live side channel of a supervised command.
///
/// The supervisor calls `line` from its coordinating loop, in the same order
/// lines are appended to the aggregates.
pub trait OutputSink: Send {
    fn started(&mut self, _invocation: &Invocation) {}

    fn line(&mut self, line: &OutputLine);

    fn finished(&mut self, _invocation: &Invocation, _result: &ExecutionResult) {}

    /// A nonzero exit under fail-fast; `finished` is not called in that case.
    fn failed(&mut self, _invocation: &Invocation, _result: &ExecutionResult) {}
}

/// Prints process output to the terminal.
///
/// Stdout lines go to our stdout untouched; stderr lines go to our stderr
/// tagged with `[stderr]` so they stand out in the merged view.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn started(&mut self, invocation: &Invocation) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(
            out,
            "{}... (command: {})",
            invocation.description, invocation.command
        );
    }

    fn line(&mut self, line: &OutputLine) {
        // Write errors (closed terminal, broken pipe) must not take down the
        // supervisor; the aggregate still has the text.
        match line.stream {
            StreamKind::Stdout => {
                let _ = writeln!(std::io::stdout().lock(), "{}", line.trimmed());
            }
            StreamKind::Stderr => {
                let _ = writeln!(std::io::stderr().lock(), "[stderr] {}", line.trimmed());
            }
        }
    }

    fn finished(&mut self, invocation: &Invocation, result: &ExecutionResult) {
        let mut out = std::io::stdout().lock();
        if result.exit_code == 0 {
            let _ = writeln!(out, "{} done.", invocation.description);
        } else {
            let _ = writeln!(
                out,
                "{} done (exit code {}).",
                invocation.description, result.exit_code
            );
        }
    }

    fn failed(&mut self, invocation: &Invocation, result: &ExecutionResult) {
        let _ = writeln!(
            std::io::stdout().lock(),
            "{} failed with exit code {}.",
            invocation.description, result.exit_code
        );
    }
}
