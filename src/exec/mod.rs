// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external commands through the host shell using
//! `tokio::process::Command`, mirroring their output live while capturing it.
//!
//! - [`invocation`] is the per-command input value.
//! - [`output`] holds output lines, the final result and the console sink.
//! - [`reader`] spawns the per-stream reader tasks.
//! - [`supervisor`] owns one process lifecycle: spawn, poll, timeout, reap.
//! - [`backend`] provides the `CommandRunner` trait that installer steps use,
//!   and which tests replace with a fake implementation.

pub mod backend;
pub mod invocation;
pub mod output;
pub mod reader;
pub mod supervisor;

pub use backend::{CommandRunner, RunFuture};
pub use invocation::{DEFAULT_TIMEOUT, Invocation};
pub use output::{ConsoleSink, ExecutionResult, OutputLine, OutputSink, StreamKind};
pub use supervisor::{DEFAULT_POLL_INTERVAL, Shell, Supervisor};
