use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Interpreter not found on PATH (tried: {})", candidates.join(", "))]
    MissingInterpreter { candidates: Vec<String> },

    #[error("Required libraries are not importable: {}", modules.join(", "))]
    MissingDependency { modules: Vec<String> },

    #[error("Model asset not found: {}", path.display())]
    MissingAsset { path: PathBuf },

    #[error("Failed to create directory {}: {reason}", path.display())]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("Failed to hand off to server entry point {}: {reason}", entry_point.display())]
    Handoff { entry_point: PathBuf, reason: String },

    #[error("Dependency installation failed (exit code {exit_code}): {stderr}")]
    RemediationFailed { exit_code: i32, stderr: String },

    #[error("Dependency installation did not finish within {timeout:?}")]
    RemediationTimeout { timeout: Duration },

    #[error("Command `{command}` did not finish within {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Environment,
    Dependency,
    Filesystem,
    Process,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LauncherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingInterpreter { .. } => ErrorCategory::Environment,
            Self::MissingDependency { .. }
            | Self::RemediationFailed { .. }
            | Self::RemediationTimeout { .. } => ErrorCategory::Dependency,
            Self::MissingAsset { .. } | Self::DirectoryCreation { .. } | Self::IoError(_) => {
                ErrorCategory::Filesystem
            }
            Self::Handoff { .. } | Self::CommandTimeout { .. } => ErrorCategory::Process,
            Self::TomlError(_) | Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorSeverity::High,
            Self::CommandTimeout { .. } => ErrorSeverity::Medium,
            _ => ErrorSeverity::Critical,
        }
    }

    /// Every fatal launcher condition terminates with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingInterpreter { candidates } => format!(
                "Could not find the required interpreter ({}) on PATH",
                candidates.join(" / ")
            ),
            Self::MissingDependency { modules } => format!(
                "Required libraries are still missing: {}",
                modules.join(", ")
            ),
            Self::MissingAsset { path } => {
                format!("Model file does not exist: {}", path.display())
            }
            Self::DirectoryCreation { path, .. } => {
                format!("Could not create directory: {}", path.display())
            }
            Self::Handoff { entry_point, .. } => {
                format!("Could not start the server: {}", entry_point.display())
            }
            Self::RemediationFailed { exit_code, .. } => {
                format!("Dependency installation exited with code {}", exit_code)
            }
            Self::RemediationTimeout { timeout } => format!(
                "Dependency installation timed out after {} seconds",
                timeout.as_secs()
            ),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::MissingInterpreter { candidates } => format!(
                "Install {} and make sure it is on PATH (e.g. `apt install python3` or https://www.python.org/downloads/)",
                candidates.first().map(String::as_str).unwrap_or("the interpreter")
            ),
            Self::MissingDependency { .. } => {
                "Install the listed packages manually with `python3 -m pip install <package>` and retry".to_string()
            }
            Self::MissingAsset { .. } => {
                "Download the correct model file and place it at the path above".to_string()
            }
            Self::DirectoryCreation { .. } => {
                "Check the permissions of the working directory or create the directory by hand".to_string()
            }
            Self::Handoff { .. } => {
                "Make sure the server entry point exists in the working directory and is runnable".to_string()
            }
            Self::RemediationFailed { .. } => {
                "Check network access and the package index, then rerun the installer manually".to_string()
            }
            Self::RemediationTimeout { .. } | Self::CommandTimeout { .. } => {
                "Retry on a faster network or raise the timeout in launcher.toml".to_string()
            }
            Self::IoError(_) => "Check file permissions and available disk space".to_string(),
            Self::TomlError(_) | Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix launcher.toml (or pass --config with a valid file)".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
