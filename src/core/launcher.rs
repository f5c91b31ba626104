use crate::config::LauncherConfig;
use crate::core::checklist::{Checklist, LaunchContext, Precondition, Probe};
use crate::domain::model::{CommandSpec, EntryKind, LaunchReport, Outcome, StepKind, StepStatus};
use crate::domain::ports::{ProcessExecutor, Workspace};
use crate::utils::error::{LauncherError, Result};
use crate::utils::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Check only: no installs, no directory creation, no handoff.
    pub dry_run: bool,
    pub allow_install: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            allow_install: true,
        }
    }
}

/// Validates the server's preconditions in order and then hands off to it.
pub struct Launcher<W: Workspace, E: ProcessExecutor> {
    config: LauncherConfig,
    workspace: W,
    executor: E,
    options: LaunchOptions,
}

impl<W: Workspace, E: ProcessExecutor> Launcher<W, E> {
    pub fn new(config: LauncherConfig, workspace: W, executor: E) -> Self {
        Self {
            config,
            workspace,
            executor,
            options: LaunchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub async fn run(&self) -> Result<Outcome> {
        let mut report = LaunchReport::new();
        self.run_with_report(&mut report).await
    }

    /// Walk the checklist, stopping at the first unrecoverable failure, then hand off.
    pub async fn run_with_report(&self, report: &mut LaunchReport) -> Result<Outcome> {
        self.log_summary();
        self.check_working_dir().await?;

        let checklist: Checklist<W, E> = Checklist::standard();
        let mut ctx = LaunchContext::new(&self.config, &self.workspace, &self.executor, self.options);

        for step in checklist.iter() {
            if let Err(e) = self.run_step(step, &mut ctx, report).await {
                return Err(self.fail(report, step.kind(), e));
            }
        }

        let command = match self.server_command(&ctx).await {
            Ok(command) => command,
            Err(e) => return Err(self.fail(report, StepKind::Handoff, e)),
        };

        if self.options.dry_run {
            let kind = StepKind::Handoff;
            status::info(&format!("{}: would start {}", kind, command));
            report.record(kind, StepStatus::Skipped, format!("would start {}", command));
            status::success("Dry run complete: all checks passed, nothing was started");
            report.finish(Outcome::DryRunComplete);
            return Ok(Outcome::DryRunComplete);
        }

        match self.handoff(&command, report).await {
            Ok(exit_code) => {
                let outcome = Outcome::HandedOff { exit_code };
                report.finish(outcome.clone());
                Ok(outcome)
            }
            Err(e) => Err(self.fail(report, StepKind::Handoff, e)),
        }
    }

    /// Every command runs from the working directory, so it has to exist first.
    async fn check_working_dir(&self) -> Result<()> {
        let root = self.workspace.root();
        let reason = match self.workspace.entry_kind(root).await? {
            EntryKind::Directory => return Ok(()),
            EntryKind::Missing => "directory does not exist",
            EntryKind::File | EntryKind::Other => "not a directory",
        };

        Err(LauncherError::InvalidConfigValueError {
            field: "working_dir".to_string(),
            value: root.display().to_string(),
            reason: reason.to_string(),
        })
    }

    async fn run_step(
        &self,
        step: &dyn Precondition<W, E>,
        ctx: &mut LaunchContext<'_, W, E>,
        report: &mut LaunchReport,
    ) -> Result<()> {
        let kind = step.kind();
        tracing::debug!("{} ...", kind);

        let detail = match step.check(ctx).await? {
            Probe::Present(detail) => {
                status::success(&format!("{}: {}", kind, detail));
                report.record(kind, StepStatus::Passed, detail);
                return Ok(());
            }
            Probe::Blocked(detail) => return Err(step.failure(ctx, &detail)),
            Probe::Absent(detail) => detail,
        };

        if !step.has_remediation(&ctx.options) {
            return Err(step.failure(ctx, &detail));
        }

        let plan = step.describe_remediation(ctx);
        if ctx.options.dry_run {
            status::warning(&format!("{}: {} (would {})", kind, detail, plan));
            report.record(kind, StepStatus::Skipped, format!("would {}", plan));
            return Ok(());
        }

        status::warning(&format!("{}: {}, attempting to {}", kind, detail, plan));
        step.remediate(ctx).await?;

        if !step.reverify_after_remediation(ctx.config) {
            // 不再次檢查，交由下游服務自行報錯
            status::warning(&format!("{}: ran \"{}\" without re-checking", kind, plan));
            report.record(kind, StepStatus::RemediationUnverified, plan);
            return Ok(());
        }

        match step.check(ctx).await? {
            Probe::Present(detail) => {
                status::success(&format!("{}: {}", kind, detail));
                report.record(kind, StepStatus::Remediated, detail);
                Ok(())
            }
            Probe::Absent(detail) | Probe::Blocked(detail) => Err(step.failure(ctx, &detail)),
        }
    }

    /// Read-only half of the handoff: the entry point must exist before anything starts.
    async fn server_command(&self, ctx: &LaunchContext<'_, W, E>) -> Result<CommandSpec> {
        let server = &self.config.server;
        let interpreter = ctx.interpreter()?;

        match self.workspace.entry_kind(&server.entry_point).await? {
            EntryKind::File => {}
            _ => {
                return Err(LauncherError::Handoff {
                    entry_point: self.workspace.resolve(&server.entry_point),
                    reason: "entry point not found".to_string(),
                })
            }
        }

        Ok(CommandSpec::new(interpreter)
            .arg(server.entry_point.to_string_lossy())
            .args(server.args.iter().cloned())
            .current_dir(self.workspace.root())
            .envs(&server.env))
    }

    async fn handoff(&self, command: &CommandSpec, report: &mut LaunchReport) -> Result<i32> {
        let kind = StepKind::Handoff;
        let mode = self.config.server.handoff;

        status::info(&format!("{}: starting {} ({})", kind, command, mode));

        let exit_code = self.executor.handoff(command, mode).await?;
        tracing::info!("Server exited with code {}", exit_code);
        report.record(
            kind,
            StepStatus::Passed,
            format!("server exited with code {}", exit_code),
        );
        Ok(exit_code)
    }

    fn fail(&self, report: &mut LaunchReport, kind: StepKind, error: LauncherError) -> LauncherError {
        tracing::debug!(
            "{} failed: {} (Category: {:?}, Severity: {:?})",
            kind,
            error,
            error.category(),
            error.severity()
        );
        report.record(kind, StepStatus::Failed, error.to_string());
        report.finish(Outcome::Failed {
            step: kind,
            message: error.to_string(),
        });
        error
    }

    fn log_summary(&self) {
        let config = &self.config;
        tracing::info!("🚀 Starting SigMOS service launcher");
        tracing::info!("📋 Launch configuration:");
        tracing::info!("  Working dir: {}", self.workspace.root().display());
        tracing::info!(
            "  Interpreter: {}",
            config.interpreter.candidates.join(", ")
        );
        tracing::info!("  Libraries: {}", config.modules().join(", "));
        tracing::info!("  Model asset: {}", config.asset.path.display());
        tracing::info!("  Upload dir: {}", config.uploads.dir.display());
        tracing::info!(
            "  Server: {} (handoff: {})",
            config.server.entry_point.display(),
            config.server.handoff
        );
        if self.options.dry_run {
            tracing::info!("  🔍 DRY RUN MODE ENABLED");
        }
        if !self.options.allow_install {
            tracing::info!("  Dependency installation disabled");
        }
    }
}
