use crate::domain::model::{CommandOutput, CommandSpec, HandoffMode};
use crate::domain::ports::ProcessExecutor;
use crate::utils::error::{LauncherError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Executor backed by real OS processes.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn spawn_and_wait(&self, command: &CommandSpec) -> Result<i32> {
        let mut cmd = tokio::process::Command::from(command.to_std());
        let mut child = cmd.spawn().map_err(|e| LauncherError::Handoff {
            entry_point: command.program.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Server started with pid {:?}", child.id());
        let status = child.wait().await?;
        Ok(exit_code_of(status))
    }

    #[cfg(unix)]
    async fn exec_replace(&self, command: &CommandSpec) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        // exec 只有失敗時才會返回
        let err = command.to_std().exec();
        Err(LauncherError::Handoff {
            entry_point: command.program.clone(),
            reason: err.to_string(),
        })
    }

    #[cfg(not(unix))]
    async fn exec_replace(&self, command: &CommandSpec) -> Result<i32> {
        tracing::debug!("Process replacement unsupported on this platform, spawning instead");
        self.spawn_and_wait(command).await
    }
}

#[async_trait]
impl ProcessExecutor for SystemExecutor {
    fn locate(&self, program: &str, cwd: &Path) -> Option<PathBuf> {
        which::which_in(program, std::env::var_os("PATH"), cwd).ok()
    }

    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("Running: {}", command);

        let mut cmd = tokio::process::Command::from(command.to_std());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match command.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| LauncherError::CommandTimeout {
                    command: command.to_string(),
                    timeout: limit,
                })??,
            None => cmd.output().await?,
        };

        Ok(CommandOutput {
            exit_code: exit_code_of(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn handoff(&self, command: &CommandSpec, mode: HandoffMode) -> Result<i32> {
        tracing::debug!("Handing off ({}): {}", mode, command);
        match mode {
            HandoffMode::Exec => self.exec_replace(command).await,
            HandoffMode::Spawn => self.spawn_and_wait(command).await,
        }
    }
}

/// Signal-terminated children report `128 + signal`, like a shell.
pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
