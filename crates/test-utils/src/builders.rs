use std::collections::BTreeMap;

use rvc_bootstrap::config::{BootstrapConfig, RawBootstrapConfig};

/// Builder for `BootstrapConfig` to simplify test setup.
pub struct ConfigBuilder {
    config: RawBootstrapConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawBootstrapConfig::default(),
        }
    }

    pub fn project_dir(mut self, dir: &str) -> Self {
        self.config.project.dir = dir.to_string();
        self
    }

    pub fn runtime_command(mut self, command: &str) -> Self {
        self.config.runtime.command = command.to_string();
        self
    }

    /// Empty string disables the runtime installer.
    pub fn installer_url(mut self, url: &str) -> Self {
        self.config.runtime.installer_url = Some(url.to_string());
        self
    }

    pub fn binaries(mut self, names: &[&str]) -> Self {
        self.config.tools.binaries = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn archive_url(mut self, url: &str) -> Self {
        self.config.tools.archive_url = Some(url.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.supervisor.timeout_secs = secs;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.supervisor.poll_interval_ms = ms;
        self
    }

    pub fn shell(mut self, argv: &[&str]) -> Self {
        self.config.supervisor.shell = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Entries of `[supervisor.env]`, replacing the default table.
    pub fn env(mut self, vars: &[(&str, &str)]) -> Self {
        self.config.supervisor.env = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>();
        self
    }

    pub fn build(self) -> BootstrapConfig {
        BootstrapConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
