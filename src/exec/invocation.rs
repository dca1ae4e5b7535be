// src/exec/invocation.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wall-clock bound for a supervised command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60_000);

/// One command to run under the supervisor.
///
/// The command line is opaque: it is handed to the host shell verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Shell command line.
    pub command: String,

    /// Human-readable step name used in console output and diagnostics.
    pub description: String,

    /// If true, a nonzero exit code is fatal.
    pub fail_fast: bool,

    /// Total runtime bound; on breach the process is killed.
    pub timeout: Duration,

    /// Working directory for the child. `None` inherits ours.
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            fail_fast: true,
            timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_fast_with_long_timeout() {
        let inv = Invocation::new("echo hi", "greet");
        assert!(inv.fail_fast);
        assert_eq!(inv.timeout, DEFAULT_TIMEOUT);
        assert!(inv.working_dir.is_none());
    }

    #[test]
    fn builder_overrides_fields() {
        let inv = Invocation::new("exit 3", "fails")
            .fail_fast(false)
            .timeout(Duration::from_secs(5))
            .in_dir("/tmp");

        assert!(!inv.fail_fast);
        assert_eq!(inv.timeout, Duration::from_secs(5));
        assert_eq!(inv.working_dir.as_deref(), Some(Path::new("/tmp")));
    }
}
