// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use rvc_bootstrap::config::{load_and_validate, load_or_default};
use rvc_bootstrap::errors::BootstrapError;
use rvc_bootstrap::exec::Supervisor;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let file = write_config(
        r#"
[project]
dir = "rvc"

[supervisor]
timeout_secs = 30
poll_interval_ms = 50
shell = ["bash", "-c"]

[supervisor.env]
PYTHONUNBUFFERED = "1"
PIP_NO_CACHE_DIR = "1"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.project.dir, "rvc");
    assert!(cfg.project.git_url.ends_with("Retrieval-based-Voice-Conversion-WebUI.git"));
    assert_eq!(cfg.environment.dir, "RBVC");
    assert_eq!(cfg.supervisor.timeout(), Duration::from_secs(30));
    assert_eq!(cfg.supervisor.poll_interval(), Duration::from_millis(50));
    assert_eq!(cfg.supervisor.env.len(), 2);

    let sup = Supervisor::from_config(&cfg.supervisor);
    assert_eq!(sup.shell().program, "bash");
    assert_eq!(sup.shell().flag, "-c");
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("[project\ndir = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BootstrapError::TomlError(_))
    ));
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_config("[supervisor]\ntimeout_secs = 0\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BootstrapError::ConfigError(_))
    ));

    let file = write_config("[tools]\nbinaries = [\"bin/ffmpeg\"]\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BootstrapError::ConfigError(_))
    ));
}

#[test]
fn explicit_missing_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Bootstrap.toml");
    assert!(matches!(
        load_or_default(&missing),
        Err(BootstrapError::IoError(_))
    ));
}
