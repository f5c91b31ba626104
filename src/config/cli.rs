use crate::config::{LauncherConfig, DEFAULT_CONFIG_FILE};
use crate::core::launcher::LaunchOptions;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Running `launch` with no arguments is the normal way to start the service.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "launch")]
#[command(about = "Check the SigMOS service prerequisites and start the API server")]
pub struct CliArgs {
    /// Path to a TOML configuration file (defaults to ./launcher.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run the read-only checks and report, without installing, creating or starting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Treat missing libraries as fatal instead of installing them
    #[arg(long)]
    pub no_install: bool,

    /// Print the launch report as JSON (dry run only)
    #[arg(long, requires = "dry_run")]
    pub json: bool,
}

impl CliArgs {
    pub fn load_config(&self) -> Result<LauncherConfig> {
        match &self.config {
            Some(path) => LauncherConfig::load(path, true),
            None => LauncherConfig::load(&PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            dry_run: self.dry_run,
            allow_install: !self.no_install,
        }
    }
}
