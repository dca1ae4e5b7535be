// src/config/validate.rs

use crate::config::model::{BootstrapConfig, RawBootstrapConfig};
use crate::errors::{BootstrapError, Result};

impl TryFrom<RawBootstrapConfig> for BootstrapConfig {
    type Error = BootstrapError;

    fn try_from(raw: RawBootstrapConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(BootstrapConfig::new_unchecked(raw))
    }
}

/// Semantic checks that serde cannot express.
///
/// This checks:
/// - download URLs are `http://` or `https://`
/// - directory names and script paths are non-empty
/// - tool binaries are bare names (they are matched by file name in the
///   archive and written into the project directory)
/// - supervisor timeout and poll interval are at least 1
/// - a shell override names a program
fn validate_raw_config(cfg: &RawBootstrapConfig) -> Result<()> {
    validate_project(cfg)?;
    validate_runtime(cfg)?;
    validate_tools(cfg)?;
    validate_install_steps(cfg)?;
    validate_supervisor(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawBootstrapConfig) -> Result<()> {
    ensure_url("[project].git_url", &cfg.project.git_url)?;
    ensure_non_empty("[project].dir", &cfg.project.dir)?;
    Ok(())
}

fn validate_runtime(cfg: &RawBootstrapConfig) -> Result<()> {
    ensure_non_empty("[runtime].command", &cfg.runtime.command)?;
    ensure_non_empty("[runtime].version", &cfg.runtime.version)?;
    if let Some(url) = cfg.runtime.resolved_installer_url() {
        ensure_url("[runtime].installer_url", &url)?;
    }
    Ok(())
}

fn validate_tools(cfg: &RawBootstrapConfig) -> Result<()> {
    if let Some(url) = cfg.tools.resolved_archive_url() {
        ensure_url("[tools].archive_url", url)?;
    }

    if cfg.tools.binaries.is_empty() {
        return Err(BootstrapError::ConfigError(
            "[tools].binaries must list at least one binary".to_string(),
        ));
    }

    for name in cfg.tools.binaries.iter() {
        ensure_non_empty("[tools].binaries entry", name)?;
        if name.contains(['/', '\\']) {
            return Err(BootstrapError::ConfigError(format!(
                "[tools].binaries entry '{}' must be a bare file name",
                name
            )));
        }
    }
    Ok(())
}

fn validate_install_steps(cfg: &RawBootstrapConfig) -> Result<()> {
    ensure_non_empty("[environment].dir", &cfg.environment.dir)?;
    ensure_url("[accelerator].torch_index_url", &cfg.accelerator.torch_index_url)?;
    if cfg.accelerator.torch_packages.is_empty() {
        return Err(BootstrapError::ConfigError(
            "[accelerator].torch_packages must not be empty".to_string(),
        ));
    }
    ensure_non_empty("[accelerator].nvidia_requirements", &cfg.accelerator.nvidia_requirements)?;
    ensure_non_empty("[accelerator].amd_requirements", &cfg.accelerator.amd_requirements)?;
    ensure_non_empty("[launch].models_script", &cfg.launch.models_script)?;
    ensure_non_empty("[launch].app_script", &cfg.launch.app_script)?;
    Ok(())
}

fn validate_supervisor(cfg: &RawBootstrapConfig) -> Result<()> {
    if cfg.supervisor.timeout_secs == 0 {
        return Err(BootstrapError::ConfigError(
            "[supervisor].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.supervisor.poll_interval_ms == 0 {
        return Err(BootstrapError::ConfigError(
            "[supervisor].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(shell) = &cfg.supervisor.shell {
        match shell.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(BootstrapError::ConfigError(
                    "[supervisor].shell must start with a program name".to_string(),
                ));
            }
        }
        if shell.len() > 2 {
            return Err(BootstrapError::ConfigError(format!(
                "[supervisor].shell takes a program and one flag (got {} entries)",
                shell.len()
            )));
        }
    }
    Ok(())
}

fn ensure_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BootstrapError::ConfigError(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn ensure_url(field: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(BootstrapError::ConfigError(format!(
            "{} must be an http(s) URL (got '{}')",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(raw: RawBootstrapConfig) -> Result<BootstrapConfig> {
        BootstrapConfig::try_from(raw)
    }

    #[test]
    fn defaults_are_valid() {
        assert!(check(RawBootstrapConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut raw = RawBootstrapConfig::default();
        raw.supervisor.timeout_secs = 0;

        match check(raw) {
            Err(BootstrapError::ConfigError(msg)) => assert!(msg.contains("timeout_secs")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn binary_with_path_is_rejected() {
        let mut raw = RawBootstrapConfig::default();
        raw.tools.binaries = vec!["bin/ffmpeg".to_string()];

        match check(raw) {
            Err(BootstrapError::ConfigError(msg)) => assert!(msg.contains("bare file name")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn non_http_archive_url_is_rejected() {
        let mut raw = RawBootstrapConfig::default();
        raw.tools.archive_url = Some("ftp://example.com/ffmpeg.zip".to_string());

        assert!(matches!(check(raw), Err(BootstrapError::ConfigError(_))));
    }

    #[test]
    fn empty_installer_url_disables_installer() {
        let mut raw = RawBootstrapConfig::default();
        raw.runtime.installer_url = Some(String::new());

        let cfg = check(raw).unwrap();
        assert!(cfg.runtime.resolved_installer_url().is_none());
    }

    #[test]
    fn shell_override_needs_program() {
        let mut raw = RawBootstrapConfig::default();
        raw.supervisor.shell = Some(vec![]);
        assert!(matches!(check(raw), Err(BootstrapError::ConfigError(_))));

        let mut raw = RawBootstrapConfig::default();
        raw.supervisor.shell = Some(vec!["bash".to_string(), "-c".to_string()]);
        assert!(check(raw).is_ok());
    }
}
