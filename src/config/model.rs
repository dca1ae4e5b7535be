// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `Bootstrap.toml`.
///
/// Every section and field is optional; the defaults reproduce the stock
/// RVC WebUI install:
///
/// ```toml
/// [project]
/// git_url = "https://github.com/RVC-Project/Retrieval-based-Voice-Conversion-WebUI.git"
/// dir = "Retrieval-based-Voice-Conversion-WebUI"
///
/// [environment]
/// dir = "RBVC"
///
/// [supervisor]
/// timeout_secs = 60000
///
/// [supervisor.env]
/// PYTHONUNBUFFERED = "1"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBootstrapConfig {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub tools: ToolsSection,

    #[serde(default)]
    pub environment: EnvironmentSection,

    #[serde(default)]
    pub accelerator: AcceleratorSection,

    #[serde(default)]
    pub launch: LaunchSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// Validated configuration. Obtain one through `TryFrom<RawBootstrapConfig>`
/// (see `validate.rs`) or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub project: ProjectSection,
    pub runtime: RuntimeSection,
    pub tools: ToolsSection,
    pub environment: EnvironmentSection,
    pub accelerator: AcceleratorSection,
    pub launch: LaunchSection,
    pub supervisor: SupervisorSection,
}

impl BootstrapConfig {
    pub(crate) fn new_unchecked(raw: RawBootstrapConfig) -> Self {
        Self {
            project: raw.project,
            runtime: raw.runtime,
            tools: raw.tools,
            environment: raw.environment,
            accelerator: raw.accelerator,
            launch: raw.launch,
            supervisor: raw.supervisor,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::new_unchecked(RawBootstrapConfig::default())
    }
}

/// `[project]`: the repository being installed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_git_url")]
    pub git_url: String,

    /// Clone target, relative to the directory the installer starts in.
    #[serde(default = "default_project_dir")]
    pub dir: String,
}

fn default_git_url() -> String {
    "https://github.com/RVC-Project/Retrieval-based-Voice-Conversion-WebUI.git".to_string()
}

fn default_project_dir() -> String {
    "Retrieval-based-Voice-Conversion-WebUI".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            git_url: default_git_url(),
            dir: default_project_dir(),
        }
    }
}

/// `[runtime]`: the Python interpreter used to build the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    #[serde(default = "default_runtime_version")]
    pub version: String,

    /// Command that launches the wanted interpreter.
    #[serde(default = "default_runtime_command")]
    pub command: String,

    /// Installer download; `{version}` is substituted. `None` means the
    /// runtime cannot be installed automatically on this platform.
    #[serde(default = "default_installer_url")]
    pub installer_url: Option<String>,

    #[serde(default = "default_installer_args")]
    pub installer_args: String,
}

fn default_runtime_version() -> String {
    "3.10.11".to_string()
}

fn default_runtime_command() -> String {
    if cfg!(windows) {
        "py -3.10".to_string()
    } else {
        "python3.10".to_string()
    }
}

fn default_installer_url() -> Option<String> {
    if cfg!(windows) {
        Some("https://www.python.org/ftp/python/{version}/python-{version}-amd64.exe".to_string())
    } else {
        None
    }
}

fn default_installer_args() -> String {
    "/quiet InstallAllUsers=1 PrependPath=1".to_string()
}

impl RuntimeSection {
    /// Installer URL with `{version}` filled in. An empty string in the file
    /// disables the installer.
    pub fn resolved_installer_url(&self) -> Option<String> {
        self.installer_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.replace("{version}", &self.version))
    }
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            version: default_runtime_version(),
            command: default_runtime_command(),
            installer_url: default_installer_url(),
            installer_args: default_installer_args(),
        }
    }
}

/// `[tools]`: prebuilt binaries fetched into the project directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// Zip archive containing the binaries somewhere in its tree. `None` (or
    /// an empty string) means the binaries are not fetched on this platform.
    #[serde(default = "default_archive_url")]
    pub archive_url: Option<String>,

    /// Binary names without the platform executable suffix.
    #[serde(default = "default_binaries")]
    pub binaries: Vec<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

// BtbN only publishes zip archives for Windows; elsewhere ffmpeg comes from
// the system package manager.
fn default_archive_url() -> Option<String> {
    if cfg!(windows) {
        Some(
            "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip"
                .to_string(),
        )
    } else {
        None
    }
}

fn default_binaries() -> Vec<String> {
    vec!["ffmpeg".to_string(), "ffprobe".to_string()]
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl ToolsSection {
    pub fn resolved_archive_url(&self) -> Option<&str> {
        self.archive_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            archive_url: default_archive_url(),
            binaries: default_binaries(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// `[environment]`: the virtual environment inside the project directory.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSection {
    #[serde(default = "default_env_dir")]
    pub dir: String,
}

fn default_env_dir() -> String {
    "RBVC".to_string()
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        Self {
            dir: default_env_dir(),
        }
    }
}

/// `[accelerator]`: PyTorch wheel index and per-vendor requirement files.
#[derive(Debug, Clone, Deserialize)]
pub struct AcceleratorSection {
    /// Base index; the variant suffix (`cu118`, `cpu`, ...) is appended.
    #[serde(default = "default_torch_index_url")]
    pub torch_index_url: String,

    #[serde(default = "default_torch_packages")]
    pub torch_packages: Vec<String>,

    #[serde(default = "default_nvidia_requirements")]
    pub nvidia_requirements: String,

    #[serde(default = "default_amd_requirements")]
    pub amd_requirements: String,
}

fn default_torch_index_url() -> String {
    "https://download.pytorch.org/whl".to_string()
}

fn default_torch_packages() -> Vec<String> {
    vec![
        "torch".to_string(),
        "torchvision".to_string(),
        "torchaudio".to_string(),
    ]
}

fn default_nvidia_requirements() -> String {
    "requirements.txt".to_string()
}

fn default_amd_requirements() -> String {
    "requirements-dml.txt".to_string()
}

impl Default for AcceleratorSection {
    fn default() -> Self {
        Self {
            torch_index_url: default_torch_index_url(),
            torch_packages: default_torch_packages(),
            nvidia_requirements: default_nvidia_requirements(),
            amd_requirements: default_amd_requirements(),
        }
    }
}

/// `[launch]`: scripts run inside the environment after installation.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchSection {
    /// Relative to the project directory, `/`-separated.
    #[serde(default = "default_models_script")]
    pub models_script: String,

    #[serde(default = "default_app_script")]
    pub app_script: String,
}

fn default_models_script() -> String {
    "tools/downloadmodels.py".to_string()
}

fn default_app_script() -> String {
    "infer-web.py".to_string()
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            models_script: default_models_script(),
            app_script: default_app_script(),
        }
    }
}

/// `[supervisor]`: how every command is run.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Override for the host shell, e.g. `["bash", "-c"]`.
    #[serde(default)]
    pub shell: Option<Vec<String>>,

    /// Extra variables injected into every child's environment.
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_env() -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
    env
}

impl SupervisorSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            shell: None,
            env: default_env(),
        }
    }
}
