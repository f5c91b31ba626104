#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::model::{HandoffMode, Library};
use crate::utils::error::{LauncherError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "launcher.toml";
pub const DEFAULT_MODEL_PATH: &str =
    "ICASSP2024/sigmos/model-sigmos_1697718653_41d092e8-epo-200.onnx";

const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Everything the launcher needs, passed in explicitly instead of read from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Relative paths below resolve against this directory.
    pub working_dir: PathBuf,
    pub interpreter: InterpreterConfig,
    pub dependencies: DependencyConfig,
    pub asset: AssetConfig,
    pub uploads: UploadConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Tried in order; the first one that resolves and runs wins.
    pub candidates: Vec<String>,
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    pub libraries: Vec<Library>,
    /// Arguments placed between the interpreter and the package list.
    pub installer_args: Vec<String>,
    pub install_timeout_secs: u64,
    /// Re-run the import probe after installing and fail if it still does not pass.
    pub verify_after_install: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub entry_point: PathBuf,
    pub args: Vec<String>,
    pub handoff: HandoffMode,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            interpreter: InterpreterConfig::default(),
            dependencies: DependencyConfig::default(),
            asset: AssetConfig::default(),
            uploads: UploadConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            candidates: vec!["python3".to_string()],
            probe_timeout_secs: 60,
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            libraries: ["flask", "soundfile", "numpy", "onnxruntime"]
                .into_iter()
                .map(Library::new)
                .collect(),
            installer_args: vec!["-m".to_string(), "pip".to_string(), "install".to_string()],
            install_timeout_secs: 600,
            verify_after_install: true,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            entry_point: PathBuf::from("sigmos_api.py"),
            args: Vec::new(),
            handoff: HandoffMode::default(),
            env: BTreeMap::new(),
        }
    }
}

impl LauncherConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| LauncherError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，缺少的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Load `path` when it exists. A missing file is only an error when the
    /// caller asked for it explicitly; otherwise the built-in defaults apply.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            tracing::debug!(
                "No {} found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 替換環境變數 (例如 ${MODEL_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LauncherError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.interpreter.probe_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.dependencies.install_timeout_secs)
    }

    pub fn modules(&self) -> Vec<String> {
        self.dependencies
            .libraries
            .iter()
            .map(|lib| lib.module.clone())
            .collect()
    }

    pub fn packages(&self) -> Vec<String> {
        self.dependencies
            .libraries
            .iter()
            .map(|lib| lib.package_name().to_string())
            .collect()
    }
}

impl Validate for LauncherConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("working_dir", &self.working_dir.to_string_lossy())?;

        validation::validate_non_empty_list("interpreter.candidates", &self.interpreter.candidates)?;
        for candidate in &self.interpreter.candidates {
            validation::validate_non_empty_string("interpreter.candidates", candidate)?;
        }
        validation::validate_range(
            "interpreter.probe_timeout_secs",
            self.interpreter.probe_timeout_secs,
            1,
            MAX_TIMEOUT_SECS,
        )?;

        validation::validate_non_empty_list("dependencies.libraries", &self.dependencies.libraries)?;
        for lib in &self.dependencies.libraries {
            validation::validate_module_name("dependencies.libraries.module", &lib.module)?;
            validation::validate_package_name(
                "dependencies.libraries.package",
                lib.package_name(),
            )?;
        }
        validation::validate_non_empty_list(
            "dependencies.installer_args",
            &self.dependencies.installer_args,
        )?;
        validation::validate_range(
            "dependencies.install_timeout_secs",
            self.dependencies.install_timeout_secs,
            1,
            MAX_TIMEOUT_SECS,
        )?;

        validation::validate_path("asset.path", &self.asset.path.to_string_lossy())?;
        validation::validate_path("uploads.dir", &self.uploads.dir.to_string_lossy())?;
        validation::validate_path("server.entry_point", &self.server.entry_point.to_string_lossy())?;

        Ok(())
    }
}
