// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! Installer steps talk to a `CommandRunner` instead of a concrete
//! [`Supervisor`]. Production code uses the supervisor; tests provide a fake
//! that records invocations and returns scripted results without spawning
//! processes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::SupervisorError;
use crate::exec::{ExecutionResult, Invocation, Supervisor};

/// Boxed future returned by [`CommandRunner::run_command`].
pub type RunFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ExecutionResult, SupervisorError>> + Send + 'a>>;

/// Trait abstracting how a single command is executed.
pub trait CommandRunner: Send {
    /// Run one invocation with the same contract as [`Supervisor::run`]:
    /// fatal conditions come back as `Err`, everything else as `Ok`.
    fn run_command<'a>(&'a mut self, invocation: &'a Invocation) -> RunFuture<'a>;
}

impl CommandRunner for Supervisor {
    fn run_command<'a>(&'a mut self, invocation: &'a Invocation) -> RunFuture<'a> {
        Box::pin(self.run(invocation))
    }
}
