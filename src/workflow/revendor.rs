use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RevendorConfig;
use crate::error::{AppError, Result};
use crate::platform::types::RepoRef;
use crate::workflow::types::RevendorOutcome;
use crate::workspace::command::{CommandRunner, Invocation};
use crate::workspace::git::GitCli;
use crate::workspace::WorkspaceManager;

pub const COMMIT_MESSAGE: &str = "updating results of `go mod tidy` and `go mod vendor`";

/// Forces module resolution to go through `vendor/`.
const GO_ENV: [(&str, &str); 2] = [("GOFLAGS", "-mod=vendor"), ("GO111MODULE", "on")];

/// Regenerates `vendor/` for one ref and pushes the result.
pub struct Revendor {
    runner: Arc<dyn CommandRunner>,
    workspaces: WorkspaceManager,
    git_program: String,
    go_program: String,
    timeout: Duration,
}

impl Revendor {
    pub fn new(config: &RevendorConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            workspaces: WorkspaceManager::new(config),
            git_program: config.git_program.clone(),
            go_program: config.go_program.clone(),
            timeout: config.timeout(),
        }
    }

    /// Clone, tidy, vendor and, if anything changed, commit and push.
    ///
    /// The whole run shares one deadline; a command still running when it
    /// passes is killed.
    pub async fn run(&self, repo: &RepoRef, git_ref: &str) -> RevendorOutcome {
        tracing::info!(repo = %repo, git_ref, timeout = ?self.timeout, "Revendoring");

        match self.try_run(repo, git_ref).await {
            Ok(outcome) => {
                tracing::info!(repo = %repo, git_ref, outcome = ?outcome, "Revendor finished");
                outcome
            }
            Err(e) => {
                tracing::error!(repo = %repo, git_ref, error = %e, "Revendor failed");
                RevendorOutcome::Failed(e)
            }
        }
    }

    async fn try_run(&self, repo: &RepoRef, git_ref: &str) -> Result<RevendorOutcome> {
        let deadline = Instant::now().checked_add(self.timeout).ok_or_else(|| {
            AppError::Config(format!("revendor timeout {:?} is out of range", self.timeout))
        })?;

        let workspace = self
            .workspaces
            .checkout(self.runner.as_ref(), repo, git_ref, deadline)
            .await?;

        let result = self.regenerate(workspace.path(), deadline).await;
        workspace.release();
        result
    }

    async fn regenerate(&self, dir: &Path, deadline: Instant) -> Result<RevendorOutcome> {
        self.go(dir, &["mod", "tidy", "-v"], deadline).await?;
        self.go(dir, &["mod", "vendor"], deadline).await?;

        let git = GitCli::new(self.runner.as_ref(), &self.git_program, deadline);
        let status = git.status(dir).await?;
        if status.trim().is_empty() {
            tracing::info!("No changes necessary");
            return Ok(RevendorOutcome::NoChangeNeeded);
        }
        tracing::info!(changed = status.lines().count(), "Repo is dirty, committing");

        git.add_all(dir).await?;
        git.commit_signed(dir, COMMIT_MESSAGE).await?;
        git.push(dir).await?;

        Ok(RevendorOutcome::Committed)
    }

    async fn go(&self, dir: &Path, args: &[&str], deadline: Instant) -> Result<()> {
        let invocation = GO_ENV.iter().fold(
            Invocation::new(&self.go_program, args.iter().copied(), dir),
            |invocation, (key, value)| invocation.env(key, value),
        );
        self.runner.run(&invocation, deadline).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkspaceStage;
    use crate::testing::{repo, FakeRunner};

    const DIRTY_STATUS: &str = "1 .M N... 100644 100644 100644 3f2a 9c1b vendor/modules.txt\n";

    struct Harness {
        base: tempfile::TempDir,
        runner: Arc<FakeRunner>,
        revendor: Revendor,
    }

    impl Harness {
        fn new(runner: FakeRunner) -> Self {
            let base = tempfile::tempdir().unwrap();
            let runner = Arc::new(runner);
            let config = RevendorConfig {
                workspace_dir: Some(base.path().to_path_buf()),
                ..RevendorConfig::default()
            };
            let revendor = Revendor::new(&config, runner.clone());
            Self {
                base,
                runner,
                revendor,
            }
        }

        fn leftover_dirs(&self) -> usize {
            std::fs::read_dir(self.base.path()).unwrap().count()
        }
    }

    #[tokio::test]
    async fn test_clean_tree_needs_no_commit() {
        let harness = Harness::new(FakeRunner::new());

        let outcome = harness.revendor.run(&repo(), "refs/heads/main").await;

        assert!(matches!(outcome, RevendorOutcome::NoChangeNeeded));
        assert_eq!(
            harness.runner.command_lines(),
            vec![
                "git clone https://github.com/octo/widgets.git .",
                "git checkout main",
                "go mod tidy -v",
                "go mod vendor",
                "git status --porcelain=v2",
            ]
        );
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_dirty_tree_is_committed_and_pushed() {
        let harness = Harness::new(FakeRunner::new().respond("git status", DIRTY_STATUS));

        let outcome = harness.revendor.run(&repo(), "feature/bump").await;

        assert!(matches!(outcome, RevendorOutcome::Committed));
        let lines = harness.runner.command_lines();
        assert_eq!(
            &lines[4..],
            &[
                "git add .".to_string(),
                format!("git commit -S -s -m {COMMIT_MESSAGE}"),
                "git push".to_string(),
            ]
        );
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_go_commands_run_in_vendor_mode() {
        let harness = Harness::new(FakeRunner::new());

        harness.revendor.run(&repo(), "main").await;

        let invocations = harness.runner.invocations();
        let go_runs: Vec<_> = invocations.iter().filter(|i| i.program == "go").collect();
        assert_eq!(go_runs.len(), 2);
        for invocation in go_runs {
            assert!(invocation.dir.ends_with("octo/widgets"));
            assert_eq!(
                invocation.env,
                vec![
                    ("GOFLAGS".to_string(), "-mod=vendor".to_string()),
                    ("GO111MODULE".to_string(), "on".to_string()),
                ]
            );
        }
        let git_runs = invocations.iter().filter(|i| i.program == "git");
        assert!(git_runs.into_iter().all(|i| i.env.is_empty()));
    }

    #[tokio::test]
    async fn test_tidy_failure_stops_the_run() {
        let harness = Harness::new(
            FakeRunner::new().fail_on("go mod tidy", "go: updates to go.mod needed"),
        );

        let outcome = harness.revendor.run(&repo(), "main").await;

        let RevendorOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("go mod tidy -v"));
        assert!(err.to_string().contains("go: updates to go.mod needed"));
        assert!(!harness
            .runner
            .command_lines()
            .iter()
            .any(|line| line.starts_with("go mod vendor") || line.starts_with("git status")));
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_clone_failure_is_workspace_error() {
        let harness = Harness::new(
            FakeRunner::new().fail_on("git clone", "fatal: could not read Username"),
        );

        let outcome = harness.revendor.run(&repo(), "main").await;

        assert!(matches!(
            outcome,
            RevendorOutcome::Failed(AppError::Workspace {
                stage: WorkspaceStage::Clone,
                ..
            })
        ));
        assert_eq!(harness.runner.command_lines().len(), 1);
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_push_failure_after_commit() {
        let harness = Harness::new(
            FakeRunner::new()
                .respond("git status", DIRTY_STATUS)
                .fail_on("git push", "! [rejected] main -> main (fetch first)"),
        );

        let outcome = harness.revendor.run(&repo(), "main").await;

        let RevendorOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("git push"));
        assert!(err.to_string().contains("[rejected]"));
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let harness = Harness::new(FakeRunner::new().time_out_on("go mod vendor"));

        let outcome = harness.revendor.run(&repo(), "main").await;

        let RevendorOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert!(matches!(err, AppError::CommandTimeout { .. }));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(harness.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_fails_without_running() {
        let base = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let config = RevendorConfig {
            timeout_secs: u64::MAX,
            workspace_dir: Some(base.path().to_path_buf()),
            ..RevendorConfig::default()
        };
        let revendor = Revendor::new(&config, runner.clone());

        let outcome = revendor.run(&repo(), "main").await;

        assert!(matches!(
            outcome,
            RevendorOutcome::Failed(AppError::Config(_))
        ));
        assert!(runner.command_lines().is_empty());
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_every_failing_step_cleans_up() {
        for step in ["git clone", "git checkout", "go mod tidy", "go mod vendor", "git status"] {
            let harness = Harness::new(FakeRunner::new().fail_on(step, "boom"));
            let outcome = harness.revendor.run(&repo(), "main").await;
            assert!(matches!(outcome, RevendorOutcome::Failed(_)), "{step}");
            assert_eq!(harness.leftover_dirs(), 0, "{step}");
        }
        for step in ["git add", "git commit", "git push"] {
            let harness = Harness::new(
                FakeRunner::new()
                    .respond("git status", DIRTY_STATUS)
                    .fail_on(step, "boom"),
            );
            let outcome = harness.revendor.run(&repo(), "main").await;
            assert!(matches!(outcome, RevendorOutcome::Failed(_)), "{step}");
            assert_eq!(harness.leftover_dirs(), 0, "{step}");
        }
    }
}
