use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rvc_bootstrap::errors::Result;
use rvc_bootstrap::exec::{
    CommandRunner, ExecutionResult, Invocation, OutputLine, OutputSink, RunFuture,
};
use rvc_bootstrap::install::Prompter;

/// A scripted reply for commands containing `needle`.
struct Script {
    needle: String,
    exit_code: i32,
    stdout: String,
}

/// A fake command runner that:
/// - records every invocation it was asked to run
/// - answers with the first script whose needle occurs in the command,
///   or a silent exit code 0
///
/// A nonzero scripted code under fail-fast turns into the same
/// `NonZeroExit` error the real supervisor returns.
#[derive(Default)]
pub struct FakeRunner {
    scripts: Vec<Script>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` exit with `exit_code` and print `stdout`.
    pub fn reply(mut self, needle: &str, exit_code: i32, stdout: &str) -> Self {
        self.scripts.push(Script {
            needle: needle.to_string(),
            exit_code,
            stdout: stdout.to_string(),
        });
        self
    }

    /// Shared handle on the recorded invocations.
    pub fn invocations(&self) -> Arc<Mutex<Vec<Invocation>>> {
        Arc::clone(&self.invocations)
    }

    /// Recorded command lines, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.command.clone())
            .collect()
    }

    fn result_for(&self, command: &str) -> ExecutionResult {
        let (exit_code, stdout) = self
            .scripts
            .iter()
            .find(|s| command.contains(&s.needle))
            .map(|s| (s.exit_code, s.stdout.clone()))
            .unwrap_or((0, String::new()));

        ExecutionResult {
            stdout,
            stderr: String::new(),
            exit_code,
            timed_out: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run_command<'a>(&'a mut self, invocation: &'a Invocation) -> RunFuture<'a> {
        Box::pin(async move {
            self.invocations.lock().unwrap().push(invocation.clone());

            let result = self.result_for(&invocation.command);
            if invocation.fail_fast && result.exit_code != 0 {
                return Err(rvc_bootstrap::errors::SupervisorError::NonZeroExit {
                    description: invocation.description.clone(),
                    code: result.exit_code,
                    result,
                });
            }
            Ok(result)
        })
    }
}

/// Answers menu questions from a fixed queue; empty once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Arc::default(),
        }
    }

    /// Shared handle on the questions asked so far.
    pub fn questions(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.questions)
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&mut self, question: &str, _options: &[&str]) -> Result<String> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

/// Sink that keeps every forwarded line, and the exit codes of fail-fast
/// failures, for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<OutputLine>>>,
    failures: Arc<Mutex<Vec<i32>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<i32> {
        self.failures.lock().unwrap().clone()
    }
}

impl OutputSink for RecordingSink {
    fn line(&mut self, line: &OutputLine) {
        self.lines.lock().unwrap().push(line.clone());
    }

    fn failed(&mut self, _invocation: &Invocation, result: &ExecutionResult) {
        self.failures.lock().unwrap().push(result.exit_code);
    }
}
