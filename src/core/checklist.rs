//! The ordered precondition checklist the launcher walks before handing off.
//!
//! Each [`Precondition`] knows how to check itself, whether it can be
//! remediated, and which error ends the run when it cannot. The launcher owns
//! the control flow; the steps only answer questions.

use crate::config::LauncherConfig;
use crate::core::launcher::LaunchOptions;
use crate::domain::model::{CommandSpec, EntryKind, StepKind};
use crate::domain::ports::{ProcessExecutor, Workspace};
use crate::utils::error::{LauncherError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Shared state threaded through the checklist for one run.
pub struct LaunchContext<'a, W: Workspace, E: ProcessExecutor> {
    pub config: &'a LauncherConfig,
    pub workspace: &'a W,
    pub executor: &'a E,
    pub options: LaunchOptions,
    /// Set by the interpreter check; every later command runs through it.
    pub interpreter: Option<PathBuf>,
}

impl<'a, W: Workspace, E: ProcessExecutor> LaunchContext<'a, W, E> {
    pub fn new(
        config: &'a LauncherConfig,
        workspace: &'a W,
        executor: &'a E,
        options: LaunchOptions,
    ) -> Self {
        Self {
            config,
            workspace,
            executor,
            options,
            interpreter: None,
        }
    }

    pub fn interpreter(&self) -> Result<&Path> {
        self.interpreter
            .as_deref()
            .ok_or_else(|| LauncherError::MissingInterpreter {
                candidates: self.config.interpreter.candidates.clone(),
            })
    }
}

/// Result of a single check, with a human-readable detail either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Present(String),
    /// Not satisfied, but remediation may fix it.
    Absent(String),
    /// Not satisfied and remediation is known to fail.
    Blocked(String),
}

#[async_trait]
pub trait Precondition<W: Workspace, E: ProcessExecutor>: Send + Sync {
    fn kind(&self) -> StepKind;

    async fn check(&self, ctx: &mut LaunchContext<'_, W, E>) -> Result<Probe>;

    fn has_remediation(&self, _options: &LaunchOptions) -> bool {
        false
    }

    /// Short phrase completing "attempting to ..." / "would ...".
    fn describe_remediation(&self, _ctx: &LaunchContext<'_, W, E>) -> String {
        String::new()
    }

    async fn remediate(&self, _ctx: &LaunchContext<'_, W, E>) -> Result<()> {
        Ok(())
    }

    fn reverify_after_remediation(&self, _config: &LauncherConfig) -> bool {
        true
    }

    /// The error that ends the run when this check cannot be satisfied.
    fn failure(&self, ctx: &LaunchContext<'_, W, E>, detail: &str) -> LauncherError;
}

pub struct Checklist<W: Workspace, E: ProcessExecutor> {
    steps: Vec<Box<dyn Precondition<W, E>>>,
}

impl<W: Workspace, E: ProcessExecutor> Checklist<W, E> {
    /// Interpreter, dependencies, asset, upload directory; in that order.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Box::new(InterpreterCheck),
                Box::new(DependencyCheck),
                Box::new(AssetCheck),
                Box::new(UploadDirProvision),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Precondition<W, E>> {
        self.steps.iter().map(|step| step.as_ref())
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.iter().map(|step| step.kind()).collect()
    }
}

pub struct InterpreterCheck;

#[async_trait]
impl<W: Workspace, E: ProcessExecutor> Precondition<W, E> for InterpreterCheck {
    fn kind(&self) -> StepKind {
        StepKind::Interpreter
    }

    async fn check(&self, ctx: &mut LaunchContext<'_, W, E>) -> Result<Probe> {
        let config = ctx.config;
        let executor = ctx.executor;
        let root = ctx.workspace.root().to_path_buf();

        for candidate in &config.interpreter.candidates {
            let Some(path) = executor.locate(candidate, &root) else {
                tracing::debug!("{} not found on PATH", candidate);
                continue;
            };

            // 能找到但無法執行的直譯器視為不存在
            let version_cmd = CommandSpec::new(&path)
                .arg("--version")
                .current_dir(&root)
                .timeout(config.probe_timeout());

            match executor.execute(&version_cmd).await {
                Ok(output) if output.success() => {
                    let version = first_line(&output.stdout)
                        .or_else(|| first_line(&output.stderr))
                        .unwrap_or(candidate.as_str())
                        .to_string();
                    let detail = format!("{} ({})", version, path.display());
                    ctx.interpreter = Some(path);
                    return Ok(Probe::Present(detail));
                }
                Ok(output) => tracing::warn!(
                    "{} --version exited with code {}",
                    path.display(),
                    output.exit_code
                ),
                Err(e) => tracing::warn!("{} could not be run: {}", path.display(), e),
            }
        }

        Ok(Probe::Absent(format!(
            "none of [{}] is available",
            config.interpreter.candidates.join(", ")
        )))
    }

    fn failure(&self, ctx: &LaunchContext<'_, W, E>, _detail: &str) -> LauncherError {
        LauncherError::MissingInterpreter {
            candidates: ctx.config.interpreter.candidates.clone(),
        }
    }
}

pub struct DependencyCheck;

impl DependencyCheck {
    pub fn import_statement(modules: &[String]) -> String {
        format!("import {}", modules.join(", "))
    }

    pub fn install_command<W: Workspace, E: ProcessExecutor>(
        ctx: &LaunchContext<'_, W, E>,
    ) -> Result<CommandSpec> {
        Ok(CommandSpec::new(ctx.interpreter()?)
            .args(ctx.config.dependencies.installer_args.iter().cloned())
            .args(ctx.config.packages())
            .current_dir(ctx.workspace.root())
            .timeout(ctx.config.install_timeout()))
    }

    /// Narrow the report to the module Python complained about, if it said.
    fn missing_modules(detail: &str, all: Vec<String>) -> Vec<String> {
        let Ok(re) = Regex::new(r"No module named '([^']+)'") else {
            return all;
        };
        match re.captures(detail) {
            Some(caps) => vec![caps[1].to_string()],
            None => all,
        }
    }
}

#[async_trait]
impl<W: Workspace, E: ProcessExecutor> Precondition<W, E> for DependencyCheck {
    fn kind(&self) -> StepKind {
        StepKind::Dependencies
    }

    async fn check(&self, ctx: &mut LaunchContext<'_, W, E>) -> Result<Probe> {
        let modules = ctx.config.modules();
        // 單一探測：任何一個模組無法匯入即視為整體失敗
        let probe = CommandSpec::new(ctx.interpreter()?)
            .arg("-c")
            .arg(Self::import_statement(&modules))
            .current_dir(ctx.workspace.root())
            .timeout(ctx.config.probe_timeout());

        let output = ctx.executor.execute(&probe).await?;
        if output.success() {
            Ok(Probe::Present(format!(
                "{} libraries importable ({})",
                modules.len(),
                modules.join(", ")
            )))
        } else {
            Ok(Probe::Absent(
                output
                    .last_error_line()
                    .unwrap_or("import probe failed")
                    .to_string(),
            ))
        }
    }

    fn has_remediation(&self, options: &LaunchOptions) -> bool {
        options.allow_install
    }

    fn describe_remediation(&self, ctx: &LaunchContext<'_, W, E>) -> String {
        format!("install {}", ctx.config.packages().join(" "))
    }

    async fn remediate(&self, ctx: &LaunchContext<'_, W, E>) -> Result<()> {
        let command = Self::install_command(ctx)?;
        tracing::debug!("Installing dependencies: {}", command);

        match ctx.executor.execute(&command).await {
            Ok(output) if output.success() => {
                tracing::debug!("Installer output:\n{}", output.stdout);
                Ok(())
            }
            Ok(output) => Err(LauncherError::RemediationFailed {
                exit_code: output.exit_code,
                stderr: output.last_error_line().unwrap_or_default().to_string(),
            }),
            Err(LauncherError::CommandTimeout { timeout, .. }) => {
                Err(LauncherError::RemediationTimeout { timeout })
            }
            Err(e) => Err(e),
        }
    }

    fn reverify_after_remediation(&self, config: &LauncherConfig) -> bool {
        config.dependencies.verify_after_install
    }

    fn failure(&self, ctx: &LaunchContext<'_, W, E>, detail: &str) -> LauncherError {
        LauncherError::MissingDependency {
            modules: Self::missing_modules(detail, ctx.config.modules()),
        }
    }
}

pub struct AssetCheck;

#[async_trait]
impl<W: Workspace, E: ProcessExecutor> Precondition<W, E> for AssetCheck {
    fn kind(&self) -> StepKind {
        StepKind::Asset
    }

    async fn check(&self, ctx: &mut LaunchContext<'_, W, E>) -> Result<Probe> {
        let path = &ctx.config.asset.path;
        let shown = ctx.workspace.resolve(path);

        Ok(match ctx.workspace.entry_kind(path).await? {
            EntryKind::File => Probe::Present(shown.display().to_string()),
            EntryKind::Missing => Probe::Absent(format!("{} not found", shown.display())),
            EntryKind::Directory => Probe::Absent(format!(
                "{} is a directory, expected a model file",
                shown.display()
            )),
            EntryKind::Other => {
                Probe::Absent(format!("{} is not a regular file", shown.display()))
            }
        })
    }

    fn failure(&self, ctx: &LaunchContext<'_, W, E>, _detail: &str) -> LauncherError {
        LauncherError::MissingAsset {
            path: ctx.workspace.resolve(&ctx.config.asset.path),
        }
    }
}

pub struct UploadDirProvision;

#[async_trait]
impl<W: Workspace, E: ProcessExecutor> Precondition<W, E> for UploadDirProvision {
    fn kind(&self) -> StepKind {
        StepKind::UploadDir
    }

    async fn check(&self, ctx: &mut LaunchContext<'_, W, E>) -> Result<Probe> {
        let dir = &ctx.config.uploads.dir;
        let shown = ctx.workspace.resolve(dir);

        Ok(match ctx.workspace.entry_kind(dir).await? {
            EntryKind::Directory => Probe::Present(shown.display().to_string()),
            EntryKind::Missing => Probe::Absent(format!("{} does not exist", shown.display())),
            EntryKind::File | EntryKind::Other => Probe::Blocked(format!(
                "{} exists but is not a directory",
                shown.display()
            )),
        })
    }

    fn has_remediation(&self, _options: &LaunchOptions) -> bool {
        true
    }

    fn describe_remediation(&self, ctx: &LaunchContext<'_, W, E>) -> String {
        format!("create {}", ctx.config.uploads.dir.display())
    }

    async fn remediate(&self, ctx: &LaunchContext<'_, W, E>) -> Result<()> {
        let dir = &ctx.config.uploads.dir;
        ctx.workspace
            .create_dir_all(dir)
            .await
            .map_err(|e| LauncherError::DirectoryCreation {
                path: ctx.workspace.resolve(dir),
                reason: e.to_string(),
            })
    }

    fn failure(&self, ctx: &LaunchContext<'_, W, E>, detail: &str) -> LauncherError {
        LauncherError::DirectoryCreation {
            path: ctx.workspace.resolve(&ctx.config.uploads.dir),
            reason: detail.to_string(),
        }
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
