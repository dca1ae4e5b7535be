// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod install;
pub mod logging;

use std::time::Duration;

use tracing::{debug, info};

use crate::cli::{CliArgs, CliCommand, ExecArgs, InstallArgs};
use crate::config::{BootstrapConfig, load_or_default};
use crate::errors::Result;
use crate::exec::{Invocation, Supervisor};
use crate::install::{GpuVendor, InstallOptions, Installer, Layout, Platform, StdinPrompter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the supervisor (with console output)
/// - either the installer workflow or a single supervised command
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    match args.command.unwrap_or(CliCommand::Install(InstallArgs::default())) {
        CliCommand::Install(install) => run_install(cfg, install.into(), args.dry_run).await,
        CliCommand::Exec(exec) => run_exec(cfg, exec, args.dry_run).await,
    }
}

async fn run_install(cfg: BootstrapConfig, options: InstallOptions, dry_run: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let layout = Layout::new(root, &cfg, Platform::current());

    if dry_run {
        print_dry_run(&cfg, &layout, &options);
        return Ok(());
    }

    println!("Starting installation of {}...", cfg.project.dir);
    println!("Make sure Git is installed and the network is reachable.\n");

    let supervisor = Supervisor::from_config(&cfg.supervisor);
    let mut installer = Installer::new(cfg, layout, supervisor, StdinPrompter, options);
    installer.run().await
}

async fn run_exec(cfg: BootstrapConfig, args: ExecArgs, dry_run: bool) -> Result<()> {
    let command = args.command.join(" ");
    let description = args.description.unwrap_or_else(|| command.clone());
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.supervisor.timeout());

    let invocation = Invocation::new(command, description)
        .fail_fast(!args.no_fail_fast)
        .timeout(timeout);

    if dry_run {
        println!("rvc-bootstrap dry-run");
        println!("  command:     {}", invocation.command);
        println!("  description: {}", invocation.description);
        println!("  fail_fast:   {}", invocation.fail_fast);
        println!("  timeout:     {}s", invocation.timeout.as_secs());
        return Ok(());
    }

    let mut supervisor = Supervisor::from_config(&cfg.supervisor);
    let result = supervisor.run(&invocation).await?;
    info!(exit_code = result.exit_code, "exec finished");
    Ok(())
}

/// Dry-run output: resolved configuration and the commands each step runs.
fn print_dry_run(cfg: &BootstrapConfig, layout: &Layout, options: &InstallOptions) {
    println!("rvc-bootstrap dry-run");
    println!("  project.dir     = {}", layout.project_dir().display());
    println!("  project.git_url = {}", cfg.project.git_url);
    println!("  runtime.command = {}", cfg.runtime.command);
    match cfg.runtime.resolved_installer_url() {
        Some(url) => println!("  runtime.installer_url = {url}"),
        None => println!("  runtime.installer_url = (none)"),
    }
    println!("  tools           = {:?}", cfg.tools.binaries);
    println!("  environment.dir = {}", layout.env_dir().display());
    println!(
        "  supervisor      = timeout {}s, poll {}ms, env {:?}",
        cfg.supervisor.timeout_secs, cfg.supervisor.poll_interval_ms, cfg.supervisor.env
    );
    println!();

    let torch = match options.torch {
        Some(variant) => variant.index_suffix().to_string(),
        None => "<detected>".to_string(),
    };
    let requirements = match options.gpu {
        Some(GpuVendor::Amd) => cfg.accelerator.amd_requirements.clone(),
        Some(GpuVendor::Nvidia) => cfg.accelerator.nvidia_requirements.clone(),
        None => "<chosen>".to_string(),
    };

    let steps: Vec<(&str, String)> = vec![
        ("check python", format!("{} --version", cfg.runtime.command)),
        (
            "clone",
            format!("git clone {} {}", cfg.project.git_url, cfg.project.dir),
        ),
        (
            "tools",
            match cfg.tools.resolved_archive_url() {
                Some(url) => format!("download {url}"),
                None => "(not fetched on this platform)".to_string(),
            },
        ),
        (
            "venv",
            format!("{} -m venv {}", cfg.runtime.command, layout.env_name()),
        ),
        (
            "torch",
            layout.in_env(&format!(
                "pip install {} --index-url {}/{}",
                cfg.accelerator.torch_packages.join(" "),
                cfg.accelerator.torch_index_url.trim_end_matches('/'),
                torch
            )),
        ),
        (
            "requirements",
            layout.in_env(&format!("pip install -r {}", requirements)),
        ),
        (
            "models",
            layout.in_env(&format!(
                "python {}",
                layout.shell_path(&cfg.launch.models_script)
            )),
        ),
    ];

    println!("steps:");
    for (name, cmd) in steps.iter() {
        println!("  - {name}");
        println!("      cmd: {cmd}");
    }
    if options.skip_launch {
        println!("  (launch skipped)");
    } else {
        println!("  - launch");
        println!(
            "      cmd: {}",
            layout.in_env(&format!("python {}", layout.shell_path(&cfg.launch.app_script)))
        );
    }

    debug!("dry-run complete (no execution)");
}
