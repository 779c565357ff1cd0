use std::path::Path;

use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::workspace::command::{CommandRunner, Invocation};

/// Validate a ref name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') {
        return Err(AppError::Command {
            command: "git checkout".to_string(),
            status: "not started".to_string(),
            output: format!("Invalid ref name: {name:?}"),
        });
    }
    Ok(())
}

/// Branch name for a ref as delivered by webhooks (`refs/heads/main` -> `main`).
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}

/// The `git` command line client, bound to one runner and deadline.
pub struct GitCli<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
    deadline: Instant,
}

impl<'a> GitCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: &'a str, deadline: Instant) -> Self {
        Self {
            runner,
            program,
            deadline,
        }
    }

    async fn git<const N: usize>(&self, dir: &Path, args: [&str; N]) -> Result<String> {
        let invocation = Invocation::new(self.program, args, dir);
        let output = self.runner.run(&invocation, self.deadline).await?;
        Ok(output.stdout)
    }

    /// Clone `url` into the (existing, empty) directory `dir`.
    pub async fn clone(&self, url: &str, dir: &Path) -> Result<()> {
        self.git(dir, ["clone", url, "."]).await?;
        Ok(())
    }

    pub async fn checkout(&self, dir: &Path, branch: &str) -> Result<()> {
        validate_ref_name(branch)?;
        self.git(dir, ["checkout", branch]).await?;
        Ok(())
    }

    /// Working tree status in porcelain v2 form. Empty when the tree is clean.
    pub async fn status(&self, dir: &Path) -> Result<String> {
        self.git(dir, ["status", "--porcelain=v2"]).await
    }

    pub async fn add_all(&self, dir: &Path) -> Result<()> {
        self.git(dir, ["add", "."]).await?;
        Ok(())
    }

    /// Commit staged changes, GPG-signed and with a Signed-off-by trailer.
    pub async fn commit_signed(&self, dir: &Path, message: &str) -> Result<()> {
        self.git(dir, ["commit", "-S", "-s", "-m", message]).await?;
        Ok(())
    }

    /// Push the current branch to its upstream.
    pub async fn push(&self, dir: &Path) -> Result<()> {
        self.git(dir, ["push"]).await?;
        Ok(())
    }
}
