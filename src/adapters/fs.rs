use crate::domain::model::EntryKind;
use crate::domain::ports::Workspace;
use crate::utils::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for LocalWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn entry_kind(&self, path: &Path) -> Result<EntryKind> {
        let full_path = self.resolve(path);

        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => Ok(EntryKind::File),
            Ok(meta) if meta.is_dir() => Ok(EntryKind::Directory),
            Ok(_) => Ok(EntryKind::Other),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(EntryKind::Missing),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve(path);
        tokio::fs::create_dir_all(full_path).await?;
        Ok(())
    }
}
