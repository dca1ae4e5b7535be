#![allow(dead_code)]

use rvc_bootstrap::exec::{Invocation, Shell, Supervisor};
use rvc_bootstrap_test_utils::fake_runner::RecordingSink;

pub use rvc_bootstrap_test_utils::{init_tracing, with_timeout};

/// Supervisor on `sh -c` with a fast tick, recording instead of printing.
pub fn supervisor() -> (Supervisor, RecordingSink) {
    let sink = RecordingSink::new();
    let supervisor = Supervisor::new()
        .with_shell(Shell::new("sh", "-c"))
        .with_poll_interval(std::time::Duration::from_millis(20))
        .with_sink(sink.clone());
    (supervisor, sink)
}

pub fn invocation(cmd: &str) -> Invocation {
    Invocation::new(cmd, format!("test `{cmd}`"))
}
