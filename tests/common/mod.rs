#![allow(dead_code)]

use async_trait::async_trait;
use sigmos_launcher::config::LauncherConfig;
use sigmos_launcher::domain::model::{CommandOutput, CommandSpec, HandoffMode};
use sigmos_launcher::domain::ports::ProcessExecutor;
use sigmos_launcher::{LauncherError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub const MODEL_PATH: &str = "ICASSP2024/sigmos/model.onnx";
pub const PYTHON: &str = "/usr/bin/python3";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Locate(String),
    Execute(CommandSpec),
    Handoff(CommandSpec, HandoffMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallBehavior {
    Fixes,
    LeavesMissing,
    ExitsWith(i32),
    TimesOut,
}

/// Records every command and answers the way a small Python environment would.
pub struct FakeExecutor {
    interpreters: HashMap<String, PathBuf>,
    broken_interpreters: Vec<PathBuf>,
    deps_present: AtomicBool,
    install: InstallBehavior,
    handoff_result: std::result::Result<i32, String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            interpreters: HashMap::from([("python3".to_string(), PathBuf::from(PYTHON))]),
            broken_interpreters: Vec::new(),
            deps_present: AtomicBool::new(true),
            install: InstallBehavior::Fixes,
            handoff_result: Ok(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_interpreters(mut self) -> Self {
        self.interpreters.clear();
        self
    }

    pub fn with_interpreter(mut self, name: &str, path: &str) -> Self {
        self.interpreters
            .insert(name.to_string(), PathBuf::from(path));
        self
    }

    /// Resolves on PATH but `--version` fails.
    pub fn with_broken_interpreter(mut self, name: &str, path: &str) -> Self {
        self.interpreters
            .insert(name.to_string(), PathBuf::from(path));
        self.broken_interpreters.push(PathBuf::from(path));
        self
    }

    pub fn with_missing_deps(self, install: InstallBehavior) -> Self {
        self.deps_present.store(false, Ordering::SeqCst);
        Self { install, ..self }
    }

    pub fn with_handoff_result(mut self, result: std::result::Result<i32, String>) -> Self {
        self.handoff_result = result;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn probes(&self) -> Vec<CommandSpec> {
        self.executed()
            .into_iter()
            .filter(|cmd| cmd.args.first().map(String::as_str) == Some("-c"))
            .collect()
    }

    pub fn installs(&self) -> Vec<CommandSpec> {
        self.executed()
            .into_iter()
            .filter(|cmd| cmd.args.iter().any(|a| a == "install"))
            .collect()
    }

    pub fn handoffs(&self) -> Vec<(CommandSpec, HandoffMode)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Handoff(cmd, mode) => Some((cmd, mode)),
                _ => None,
            })
            .collect()
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failed(exit_code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl ProcessExecutor for FakeExecutor {
    fn locate(&self, program: &str, _cwd: &Path) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Locate(program.to_string()));
        self.interpreters.get(program).cloned()
    }

    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Execute(command.clone()));

        match command.args.first().map(String::as_str) {
            Some("--version") if self.broken_interpreters.contains(&command.program) => {
                Ok(Self::failed(127, "cannot execute binary file"))
            }
            Some("--version") => Ok(Self::ok("Python 3.11.4\n")),
            Some("-c") if self.deps_present.load(Ordering::SeqCst) => Ok(Self::ok("")),
            Some("-c") => Ok(Self::failed(
                1,
                "Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\nModuleNotFoundError: No module named 'onnxruntime'\n",
            )),
            _ if command.args.iter().any(|a| a == "install") => match self.install {
                InstallBehavior::Fixes => {
                    self.deps_present.store(true, Ordering::SeqCst);
                    Ok(Self::ok("Successfully installed onnxruntime-1.17.0\n"))
                }
                InstallBehavior::LeavesMissing => Ok(Self::ok("Requirement already satisfied\n")),
                InstallBehavior::ExitsWith(code) => Ok(Self::failed(
                    code,
                    "ERROR: Could not find a version that satisfies the requirement onnxruntime\n",
                )),
                InstallBehavior::TimesOut => Err(LauncherError::CommandTimeout {
                    command: command.to_string(),
                    timeout: command.timeout.unwrap_or(Duration::from_secs(600)),
                }),
            },
            _ => Ok(Self::failed(2, "unexpected command")),
        }
    }

    async fn handoff(&self, command: &CommandSpec, mode: HandoffMode) -> Result<i32> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Handoff(command.clone(), mode));
        self.handoff_result
            .clone()
            .map_err(|reason| LauncherError::Handoff {
                entry_point: command.program.clone(),
                reason,
            })
    }
}

/// A temp working directory holding the model file and server entry point.
pub fn prepared_workspace() -> (TempDir, LauncherConfig) {
    let temp_dir = TempDir::new().unwrap();
    let model = temp_dir.path().join(MODEL_PATH);
    std::fs::create_dir_all(model.parent().unwrap()).unwrap();
    std::fs::write(&model, b"onnx-model-bytes").unwrap();
    std::fs::write(temp_dir.path().join("sigmos_api.py"), b"print('serving')\n").unwrap();

    let mut config = LauncherConfig::default();
    config.working_dir = temp_dir.path().to_path_buf();
    config.asset.path = PathBuf::from(MODEL_PATH);
    config.server.handoff = HandoffMode::Spawn;

    (temp_dir, config)
}
