pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::{LocalWorkspace, SystemExecutor};
pub use crate::config::LauncherConfig;
pub use crate::core::launcher::{LaunchOptions, Launcher};
pub use crate::domain::model::{LaunchReport, Outcome};
pub use crate::utils::error::{LauncherError, Result};
