use crate::domain::model::{CommandOutput, CommandSpec, EntryKind, HandoffMode};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Filesystem view rooted at the launcher's working directory.
pub trait Workspace: Send + Sync + 'static {
    fn root(&self) -> &Path;

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }

    /// Read-only lookup; never creates anything.
    fn entry_kind(&self, path: &Path) -> impl std::future::Future<Output = Result<EntryKind>> + Send;

    /// Create `path` and any missing parents. Succeeds when it already exists.
    fn create_dir_all(&self, path: &Path) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Runs external programs on behalf of the launcher.
#[async_trait]
pub trait ProcessExecutor: Send + Sync + 'static {
    /// Resolve `program` the way a shell would, searching PATH from `cwd`.
    fn locate(&self, program: &str, cwd: &Path) -> Option<PathBuf>;

    /// Run to completion with captured output. Honors `command.timeout`.
    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// Start the downstream server with inherited stdio and return its exit status.
    /// With [`HandoffMode::Exec`] a successful call does not return.
    async fn handoff(&self, command: &CommandSpec, mode: HandoffMode) -> Result<i32>;
}
