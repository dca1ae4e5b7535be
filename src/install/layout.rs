// src/install/layout.rs

//! On-disk layout of an installation and the platform-specific spelling of
//! paths that end up inside shell command lines.

use std::path::{Path, PathBuf};

use crate::config::BootstrapConfig;

/// Shell dialect the command lines are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::Unix => '/',
        }
    }

    fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Unix => "",
        }
    }
}

/// Where everything lives for one installer run.
#[derive(Debug, Clone)]
pub struct Layout {
    platform: Platform,
    root: PathBuf,
    project_dir: PathBuf,
    env_name: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, config: &BootstrapConfig, platform: Platform) -> Self {
        let root = root.into();
        let project_dir = root.join(&config.project.dir);
        Self {
            platform,
            root,
            project_dir,
            env_name: config.environment.dir.clone(),
        }
    }

    /// Directory the installer was started in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn env_dir(&self) -> PathBuf {
        self.project_dir.join(&self.env_name)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Location of a fetched tool binary inside the project directory.
    pub fn tool_path(&self, name: &str) -> PathBuf {
        self.project_dir
            .join(format!("{}{}", name, self.platform.exe_suffix()))
    }

    /// Tool file name as it appears inside the download archive.
    pub fn tool_file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.platform.exe_suffix())
    }

    /// Command prefix that activates the environment, relative to the
    /// project directory.
    pub fn activate_command(&self) -> String {
        match self.platform {
            Platform::Windows => format!("call {}\\Scripts\\activate", self.env_name),
            Platform::Unix => format!(". {}/bin/activate", self.env_name),
        }
    }

    /// Environment interpreter, relative to the project directory.
    pub fn env_python(&self) -> String {
        match self.platform {
            Platform::Windows => format!("{}\\Scripts\\python.exe", self.env_name),
            Platform::Unix => format!("{}/bin/python", self.env_name),
        }
    }

    /// A `/`-separated relative path spelled for the platform's shell.
    pub fn shell_path(&self, relative: &str) -> String {
        relative
            .split(['/', '\\'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(&self.platform.separator().to_string())
    }

    /// `<activate> && <command>`.
    pub fn in_env(&self, command: &str) -> String {
        format!("{} && {}", self.activate_command(), command)
    }
}
