// src/install/mod.rs

//! The installer workflow.
//!
//! Steps run strictly in order; any fatal condition aborts the whole run:
//!
//! 1. [`Installer::ensure_runtime`]: make sure the Python interpreter exists.
//! 2. [`Installer::clone_project`]: clone the WebUI repository.
//! 3. [`Installer::fetch_tools`]: download ffmpeg / ffprobe.
//! 4. [`Installer::reset_environment`]: drop a stale virtual environment.
//! 5. [`Installer::create_environment`]: create and verify a fresh one.
//! 6. [`Installer::install_torch`]: pick a PyTorch build for the accelerator.
//! 7. [`Installer::install_requirements`]: per-vendor dependency set.
//! 8. [`Installer::download_models`] and [`Installer::launch`].
//!
//! Every external command goes through a [`CommandRunner`], every question
//! through a [`Prompter`].

pub mod accelerator;
pub mod archive;
pub mod download;
pub mod layout;
pub mod prompt;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::errors::{BootstrapError, Result};
use crate::exec::{CommandRunner, ExecutionResult, Invocation};

pub use accelerator::{GpuVendor, TorchVariant, parse_cuda_release};
pub use layout::{Layout, Platform};
pub use prompt::{Prompter, StdinPrompter};

use archive::extract_binaries;
use download::download_to;

/// File name the runtime installer is saved under, in the root directory.
const RUNTIME_INSTALLER: &str = "python-installer.exe";

/// File name the tools archive is saved under, in the project directory.
const TOOLS_ARCHIVE: &str = "tools-download.zip";

/// Choices that would otherwise be asked interactively.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Force a PyTorch build instead of detecting / asking.
    pub torch: Option<TorchVariant>,

    /// Pick the vendor without asking.
    pub gpu: Option<GpuVendor>,

    /// Stop after installation instead of starting the WebUI.
    pub skip_launch: bool,
}

pub struct Installer<R, P> {
    config: BootstrapConfig,
    layout: Layout,
    runner: R,
    prompter: P,
    options: InstallOptions,
}

impl<R: CommandRunner, P: Prompter> Installer<R, P> {
    pub fn new(
        config: BootstrapConfig,
        layout: Layout,
        runner: R,
        prompter: P,
        options: InstallOptions,
    ) -> Self {
        Self {
            config,
            layout,
            runner,
            prompter,
            options,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every step in order.
    pub async fn run(&mut self) -> Result<()> {
        self.ensure_runtime().await?;
        println!(
            "Using `{}` to create the virtual environment.",
            self.config.runtime.command
        );

        self.clone_project().await?;
        self.fetch_tools().await?;
        self.reset_environment()?;
        self.create_environment().await?;
        self.install_torch().await?;
        self.install_requirements().await?;
        self.download_models().await?;

        if self.options.skip_launch {
            println!("\nInstallation complete.");
            info!("launch skipped on request");
            return Ok(());
        }

        println!("\nInstallation complete, starting the WebUI...");
        self.launch().await
    }

    /// Make sure the configured interpreter runs, installing it if possible.
    pub async fn ensure_runtime(&mut self) -> Result<()> {
        let probe = self.probe_runtime("Check Python availability").await?;
        if probe.exit_code == 0 {
            println!("Python available: {}", probe.first_output());
            return Ok(());
        }

        let runtime = &self.config.runtime;
        let Some(url) = runtime.resolved_installer_url() else {
            return Err(BootstrapError::Runtime(format!(
                "`{}` is not available and no installer is configured for this platform; \
                 install Python {} and run again",
                runtime.command, runtime.version
            )));
        };

        println!("Python {} not found, installing it...", runtime.version);
        self.install_runtime(&url).await?;

        let probe = self.probe_runtime("Verify Python installation").await?;
        if probe.exit_code != 0 {
            return Err(BootstrapError::Runtime(format!(
                "Python {} installation could not be verified; restart the shell or install it manually",
                self.config.runtime.version
            )));
        }
        println!("Python installed: {}", probe.first_output());
        Ok(())
    }

    async fn probe_runtime(&mut self, description: &str) -> Result<ExecutionResult> {
        let inv = self
            .root_step(format!("{} --version", self.config.runtime.command), description)
            .fail_fast(false);
        self.exec(inv).await
    }

    async fn install_runtime(&mut self, url: &str) -> Result<()> {
        let installer = self.layout.root().join(RUNTIME_INSTALLER);
        download_to(url, &installer, self.config.tools.connect_timeout()).await?;

        let inv = self.root_step(
            format!("{} {}", RUNTIME_INSTALLER, self.config.runtime.installer_args),
            format!("Install Python {}", self.config.runtime.version),
        );
        let outcome = self.exec(inv).await;
        remove_if_present(&installer).await;
        outcome.map(|_| ())
    }

    /// Clone the project unless its directory already exists.
    pub async fn clone_project(&mut self) -> Result<()> {
        if self.layout.project_dir().exists() {
            println!("Repository already present, skipping clone.");
            return Ok(());
        }

        let inv = self.root_step(
            format!(
                "git clone {} {}",
                self.config.project.git_url, self.config.project.dir
            ),
            "Clone repository",
        );
        self.exec(inv).await?;
        Ok(())
    }

    /// Download the tool archive and extract the configured binaries into
    /// the project directory, unless they are all present already. Without
    /// an archive URL the binaries are expected on `PATH`.
    pub async fn fetch_tools(&mut self) -> Result<()> {
        let binaries = &self.config.tools.binaries;
        if binaries.iter().all(|b| self.layout.tool_path(b).is_file()) {
            println!("{} already present, skipping download.", binaries.join(" and "));
            return Ok(());
        }

        let Some(url) = self.config.tools.resolved_archive_url().map(str::to_string) else {
            println!(
                "No {} download configured for this platform; install them with your package manager.",
                binaries.join(" and ")
            );
            warn!("[tools].archive_url not set; skipping tool download");
            return Ok(());
        };

        let file_names: Vec<String> = binaries
            .iter()
            .map(|b| self.layout.tool_file_name(b))
            .collect();
        println!("Downloading {}...", binaries.join(" and "));

        let archive = self.layout.project_dir().join(TOOLS_ARCHIVE);
        let outcome = self
            .download_and_extract(&url, &archive, file_names.clone())
            .await;
        remove_if_present(&archive).await;

        let written = match outcome {
            Ok(written) => written,
            Err(err @ BootstrapError::Download { .. }) => {
                eprintln!(
                    "Check the network connection or download the archive manually: {}",
                    url
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let missing: Vec<&String> = file_names
            .iter()
            .filter(|name| !written.iter().any(|p| p.file_name().is_some_and(|f| f == name.as_str())))
            .collect();
        if !missing.is_empty() {
            return Err(BootstrapError::Archive {
                path: archive,
                reason: format!("archive does not contain {:?}", missing),
            });
        }

        println!("{} downloaded and extracted.", binaries.join(" and "));
        Ok(())
    }

    async fn download_and_extract(
        &self,
        url: &str,
        archive: &Path,
        file_names: Vec<String>,
    ) -> Result<Vec<PathBuf>> {
        download_to(url, archive, self.config.tools.connect_timeout()).await?;

        let archive = archive.to_path_buf();
        let dest = self.layout.project_dir().to_path_buf();
        tokio::task::spawn_blocking(move || extract_binaries(&archive, &dest, &file_names))
            .await
            .map_err(anyhow::Error::from)?
    }

    /// Remove a virtual environment left over from a previous run.
    pub fn reset_environment(&mut self) -> Result<()> {
        let env_dir = self.layout.env_dir();
        if !env_dir.exists() {
            return Ok(());
        }

        println!("Found old virtual environment {}, removing it...", self.layout.env_name());
        std::fs::remove_dir_all(&env_dir).map_err(|e| {
            BootstrapError::Environment(format!(
                "failed to remove old virtual environment {:?}: {}; delete the {} folder manually and retry",
                env_dir,
                e,
                self.layout.env_name()
            ))
        })?;
        info!(env_dir = ?env_dir, "old environment removed");
        Ok(())
    }

    /// Create the virtual environment and check that it activates.
    pub async fn create_environment(&mut self) -> Result<()> {
        let env_name = self.layout.env_name().to_string();

        let create = self.step(
            format!("{} -m venv {}", self.config.runtime.command, env_name),
            format!("Create virtual environment {}", env_name),
        );
        self.exec(create).await?;

        let version = self
            .step(
                format!("{} --version", self.layout.env_python()),
                "Check virtual environment Python version",
            )
            .fail_fast(false);
        let version = self.exec(version).await?;
        println!("Virtual environment Python: {}", version.first_output());

        let activated = self.step(
            self.layout.in_env("python --version"),
            "Check Python version after activation",
        );
        self.exec(activated).await?;
        Ok(())
    }

    /// Pick a PyTorch build and install it. Returns the chosen variant.
    ///
    /// An explicit `--torch` choice wins; otherwise `nvcc` is asked, and if
    /// that finds nothing the user picks from a menu.
    pub async fn install_torch(&mut self) -> Result<TorchVariant> {
        let variant = match self.options.torch {
            Some(variant) => variant,
            None => match self.detect_cuda().await? {
                Some(variant) => {
                    println!("Detected {}", variant);
                    variant
                }
                None => {
                    let answer = self.prompter.choose(
                        "No CUDA version detected, please choose:",
                        &TorchVariant::MENU,
                    )?;
                    TorchVariant::from_menu(&answer)
                }
            },
        };
        info!(%variant, "installing PyTorch");

        let accel = &self.config.accelerator;
        let command = self.layout.in_env(&format!(
            "pip install {} --index-url {}/{}",
            accel.torch_packages.join(" "),
            accel.torch_index_url.trim_end_matches('/'),
            variant.index_suffix()
        ));
        let inv = self.step(command, format!("Install PyTorch ({})", variant));
        self.exec(inv).await?;
        Ok(variant)
    }

    async fn detect_cuda(&mut self) -> Result<Option<TorchVariant>> {
        let inv = self
            .root_step("nvcc --version", "Detect CUDA version")
            .fail_fast(false);
        let probe = self.exec(inv).await?;

        if probe.exit_code != 0 {
            warn!(exit_code = probe.exit_code, "nvcc failed; check that CUDA is on PATH");
            return Ok(None);
        }

        let found = parse_cuda_release(&probe.stdout);
        if found.is_none() {
            println!("No supported CUDA version found (11.8, 12.4, 12.6, 12.8).");
        }
        Ok(found)
    }

    /// Install the vendor-specific requirements file. Returns the vendor.
    pub async fn install_requirements(&mut self) -> Result<GpuVendor> {
        let vendor = match self.options.gpu {
            Some(vendor) => vendor,
            None => {
                let answer = self
                    .prompter
                    .choose("Please choose your GPU type:", &GpuVendor::MENU)?;
                GpuVendor::from_menu(&answer).unwrap_or_else(|| {
                    println!("Invalid choice, using the Nvidia configuration.");
                    GpuVendor::default()
                })
            }
        };

        let file = match vendor {
            GpuVendor::Nvidia => &self.config.accelerator.nvidia_requirements,
            GpuVendor::Amd => &self.config.accelerator.amd_requirements,
        };
        let command = self.layout.in_env(&format!("pip install -r {}", file));
        let inv = self.step(command, "Install remaining dependencies");
        self.exec(inv).await?;
        Ok(vendor)
    }

    pub async fn download_models(&mut self) -> Result<()> {
        let script = self.layout.shell_path(&self.config.launch.models_script);
        let inv = self.step(
            self.layout.in_env(&format!("python {}", script)),
            "Download pretrained models",
        );
        self.exec(inv).await?;
        Ok(())
    }

    pub async fn launch(&mut self) -> Result<()> {
        let script = self.layout.shell_path(&self.config.launch.app_script);
        let inv = self.step(
            self.layout.in_env(&format!("python {}", script)),
            "Start WebUI",
        );
        self.exec(inv).await?;
        Ok(())
    }

    /// An invocation running inside the project directory.
    fn step(&self, command: impl Into<String>, description: impl Into<String>) -> Invocation {
        Invocation::new(command, description)
            .timeout(self.config.supervisor.timeout())
            .in_dir(self.layout.project_dir())
    }

    /// An invocation running in the directory the installer started in.
    fn root_step(&self, command: impl Into<String>, description: impl Into<String>) -> Invocation {
        Invocation::new(command, description)
            .timeout(self.config.supervisor.timeout())
            .in_dir(self.layout.root())
    }

    async fn exec(&mut self, invocation: Invocation) -> Result<ExecutionResult> {
        Ok(self.runner.run_command(&invocation).await?)
    }
}

async fn remove_if_present(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = ?path, error = %err, "failed to remove temporary file");
        }
    }
}
