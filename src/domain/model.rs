use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A library the downstream server imports.
///
/// `module` is what gets imported; `package` is what the installer is asked
/// for and defaults to the module name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl Library {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            package: None,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.module)
    }
}

/// One external command invocation, independent of how it gets run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, which is where interpreters put the actual error.
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}

/// How control is passed to the downstream server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the launcher process image (Unix only; falls back to spawn elsewhere).
    Exec,
    /// Start a child, wait for it, and forward its exit status.
    Spawn,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            HandoffMode::Exec
        } else {
            HandoffMode::Spawn
        }
    }
}

impl fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffMode::Exec => write!(f, "exec"),
            HandoffMode::Spawn => write!(f, "spawn"),
        }
    }
}

/// What a filesystem path currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    File,
    Directory,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Interpreter,
    Dependencies,
    Asset,
    UploadDir,
    Handoff,
}

impl StepKind {
    pub const COUNT: usize = 5;

    pub fn ordinal(self) -> usize {
        match self {
            StepKind::Interpreter => 1,
            StepKind::Dependencies => 2,
            StepKind::Asset => 3,
            StepKind::UploadDir => 4,
            StepKind::Handoff => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::Interpreter => "interpreter check",
            StepKind::Dependencies => "dependency check",
            StepKind::Asset => "model asset check",
            StepKind::UploadDir => "upload directory",
            StepKind::Handoff => "server handoff",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.ordinal(), Self::COUNT, self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Remediated,
    RemediationUnverified,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepKind,
    pub status: StepStatus,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    HandedOff { exit_code: i32 },
    DryRunComplete,
    Failed { step: StepKind, message: String },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::HandedOff { exit_code } => *exit_code,
            Outcome::DryRunComplete => 0,
            Outcome::Failed { .. } => 1,
        }
    }
}

/// Per-run trace of the checklist. Lives for exactly one launcher invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub started_at: DateTime<Local>,
    pub steps: Vec<StepRecord>,
    pub outcome: Option<Outcome>,
}

impl LaunchReport {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            steps: Vec::new(),
            outcome: None,
        }
    }

    pub fn record(&mut self, step: StepKind, status: StepStatus, detail: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            status,
            detail: detail.into(),
        });
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn status_of(&self, step: StepKind) -> Option<StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| r.status)
    }

    pub fn executed_steps(&self) -> Vec<StepKind> {
        self.steps.iter().map(|r| r.step).collect()
    }
}

impl Default for LaunchReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_package_defaults_to_module() {
        assert_eq!(Library::new("numpy").package_name(), "numpy");
        assert_eq!(
            Library::new("sklearn")
                .with_package("scikit-learn")
                .package_name(),
            "scikit-learn"
        );
    }

    #[test]
    fn test_command_display_quotes_whitespace() {
        let cmd = CommandSpec::new("python3")
            .arg("-c")
            .arg("import flask, numpy");
        assert_eq!(cmd.to_string(), "python3 -c \"import flask, numpy\"");
    }

    #[test]
    fn test_last_error_line_skips_blank_lines() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "Traceback (most recent call last):\n  File \"<string>\", line 1\nModuleNotFoundError: No module named 'flask'\n\n".to_string(),
        };
        assert_eq!(
            output.last_error_line(),
            Some("ModuleNotFoundError: No module named 'flask'")
        );
    }

    #[test]
    fn test_step_ordinals_are_sequential() {
        let steps = [
            StepKind::Interpreter,
            StepKind::Dependencies,
            StepKind::Asset,
            StepKind::UploadDir,
            StepKind::Handoff,
        ];
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.ordinal(), i + 1);
        }
        assert_eq!(StepKind::Asset.to_string(), "[3/5] model asset check");
    }

    #[test]
    fn test_report_serializes_outcome() {
        let mut report = LaunchReport::new();
        report.record(StepKind::Interpreter, StepStatus::Passed, "Python 3.11.4");
        report.finish(Outcome::DryRunComplete);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][0]["step"], "interpreter");
        assert_eq!(json["steps"][0]["status"], "passed");
        assert_eq!(json["outcome"]["state"], "dry_run_complete");
    }
}
