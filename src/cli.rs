// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::install::{GpuVendor, InstallOptions, TorchVariant};

/// Command-line arguments for `rvc-bootstrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rvc-bootstrap",
    version,
    about = "Install and launch the Retrieval-based-Voice-Conversion WebUI.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Bootstrap.toml` in the current working directory. If the
    /// default file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Bootstrap.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RVC_BOOTSTRAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print what would run, but don't execute any commands.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run the full installation (the default).
    Install(InstallArgs),

    /// Run a single shell command under the supervisor.
    Exec(ExecArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct InstallArgs {
    /// PyTorch build to install (11.8, 12.4, 12.6, 12.8 or cpu); skips
    /// CUDA detection and the menu.
    #[arg(long, value_name = "VARIANT")]
    pub torch: Option<TorchVariant>,

    /// GPU vendor (nvidia or amd); skips the menu.
    #[arg(long, value_name = "VENDOR")]
    pub gpu: Option<GpuVendor>,

    /// Stop after installing instead of starting the WebUI.
    #[arg(long)]
    pub skip_launch: bool,
}

impl From<InstallArgs> for InstallOptions {
    fn from(args: InstallArgs) -> Self {
        Self {
            torch: args.torch,
            gpu: args.gpu,
            skip_launch: args.skip_launch,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Step name used in output and diagnostics. Defaults to the command.
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Timeout in seconds. Defaults to `[supervisor].timeout_secs`.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Report a nonzero exit code instead of failing.
    #[arg(long)]
    pub no_fail_fast: bool,

    /// Shell command line; multiple words are joined with spaces.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
