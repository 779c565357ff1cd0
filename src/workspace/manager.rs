use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::time::Instant;

use crate::config::RevendorConfig;
use crate::error::{AppError, Result, WorkspaceStage};
use crate::platform::types::RepoRef;
use crate::workspace::command::CommandRunner;
use crate::workspace::git::{branch_name, GitCli};

/// Creates throwaway checkouts for revendor runs.
pub struct WorkspaceManager {
    base_dir: PathBuf,
    git_program: String,
}

/// A checked-out repository inside its own temporary directory.
///
/// The directory is removed exactly once: by `release`, or when the
/// workspace is dropped, whichever comes first.
#[derive(Debug)]
pub struct Workspace {
    root: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// The repository's working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        let dir = root.path().to_path_buf();
        match root.close() {
            Ok(()) => tracing::debug!(dir = %dir.display(), "Removed workspace"),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove workspace")
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}

impl WorkspaceManager {
    pub fn new(config: &RevendorConfig) -> Self {
        Self {
            base_dir: config.workspace_dir(),
            git_program: config.git_program.clone(),
        }
    }

    /// Clone `repo` into a fresh directory and check out `git_ref`.
    ///
    /// On failure the directory is already gone when the error is returned.
    pub async fn checkout(
        &self,
        runner: &dyn CommandRunner,
        repo: &RepoRef,
        git_ref: &str,
        deadline: Instant,
    ) -> Result<Workspace> {
        let workspace = self.create(repo).await?;
        let git = GitCli::new(runner, &self.git_program, deadline);

        tracing::info!(repo = %repo, dir = %workspace.path().display(), "Cloning");
        git.clone(&repo.clone_url, workspace.path())
            .await
            .map_err(|e| AppError::workspace(WorkspaceStage::Clone, e))?;

        let branch = branch_name(git_ref);
        git.checkout(workspace.path(), branch)
            .await
            .map_err(|e| AppError::workspace(WorkspaceStage::Checkout, e))?;

        Ok(workspace)
    }

    async fn create(&self, repo: &RepoRef) -> Result<Workspace> {
        for component in [&repo.owner, &repo.name] {
            validate_path_component(component)?;
        }

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| AppError::workspace(WorkspaceStage::CreateDir, e))?;

        let root = tempfile::Builder::new()
            .prefix("revendor-")
            .tempdir_in(&self.base_dir)
            .map_err(|e| AppError::workspace(WorkspaceStage::CreateDir, e))?;

        let path = root.path().join(&repo.owner).join(&repo.name);
        let workspace = Workspace {
            root: Some(root),
            path,
        };

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder
            .create(workspace.path())
            .await
            .map_err(|e| AppError::workspace(WorkspaceStage::CreateDir, e))?;

        Ok(workspace)
    }
}

fn validate_path_component(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(AppError::workspace(
            WorkspaceStage::CreateDir,
            format!("Refusing to use {name:?} as a directory name"),
        ));
    }
    Ok(())
}
