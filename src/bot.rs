use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::config::RevendorConfig;
use crate::error::{AppError, Result};
use crate::platform::types::RepoRef;
use crate::platform::Platform;
use crate::webhook::classify::{classify, Action};
use crate::workflow::detect::requires_revendor;
use crate::workflow::notify::Notifier;
use crate::workflow::revendor::Revendor;
use crate::workflow::types::RevendorOutcome;
use crate::workspace::command::CommandRunner;

pub const MAY_NEED_REVENDOR: &str =
    ":robot: RevendorBot says `go.mod` or `go.sum` modified, may need to revendor.";
pub const NO_REVENDOR_NEEDED: &str =
    ":robot: RevendorBot doesn't need to revendor! :beach_umbrella:";

fn done_message(outcome: &RevendorOutcome, elapsed: Duration) -> String {
    match outcome {
        RevendorOutcome::NoChangeNeeded => format!(
            ":robot: RevendorBot done, `vendor/` was already up to date :hourglass: {elapsed:.2?}"
        ),
        RevendorOutcome::Committed => format!(":robot: RevendorBot done :hourglass: {elapsed:.2?}"),
        RevendorOutcome::Failed(error) => failure_message(error, elapsed),
    }
}

fn failure_message(error: &AppError, elapsed: Duration) -> String {
    format!(
        ":robot: :warning: RevendorBot got an error while trying to revendor:\n```\n{error}\n```\n\nTook {elapsed:.2?}"
    )
}

/// Handles one webhook delivery from classification to the final comment.
pub struct Bot {
    platform: Arc<dyn Platform>,
    revendor: Revendor,
    started: Instant,
}

impl Bot {
    /// Durations reported in comments are measured from this call.
    pub fn new(
        platform: Arc<dyn Platform>,
        runner: Arc<dyn CommandRunner>,
        config: &RevendorConfig,
    ) -> Self {
        Self {
            platform,
            revendor: Revendor::new(config, runner),
            started: Instant::now(),
        }
    }

    pub async fn handle(&self, event_type: &str, delivery_id: &str, payload: &[u8]) -> Result<()> {
        let span = tracing::info_span!("delivery", id = %delivery_id, event = %event_type);
        self.dispatch(event_type, payload).instrument(span).await
    }

    async fn dispatch(&self, event_type: &str, payload: &[u8]) -> Result<()> {
        match classify(event_type, payload)? {
            Action::Ignore => Ok(()),
            Action::EvaluatePush { git_ref, repo } => self.handle_push(&repo, &git_ref).await,
            Action::EvaluateComment {
                repo,
                pr_number,
                comment_id,
            } => self.handle_comment(&repo, pr_number, comment_id).await,
        }
    }

    /// Pushes have no conversation to report to; only failures surface.
    async fn handle_push(&self, repo: &RepoRef, git_ref: &str) -> Result<()> {
        if !requires_revendor(self.platform.as_ref(), repo, git_ref).await {
            tracing::info!(repo = %repo, git_ref, "No need to revendor");
            return Ok(());
        }

        match self.revendor.run(repo, git_ref).await {
            RevendorOutcome::Failed(e) => Err(e),
            RevendorOutcome::NoChangeNeeded | RevendorOutcome::Committed => Ok(()),
        }
    }

    async fn handle_comment(&self, repo: &RepoRef, pr_number: u64, comment_id: u64) -> Result<()> {
        let notifier = Notifier::new(self.platform.as_ref());

        let result = self
            .revendor_pull_request(&notifier, repo, pr_number, comment_id)
            .await;
        let elapsed = self.started.elapsed();

        match result {
            Ok(None) => Ok(()),
            Ok(Some(outcome)) => {
                notifier
                    .post(repo, pr_number, &done_message(&outcome, elapsed))
                    .await
            }
            Err(e) => {
                if let Err(notify_err) = notifier
                    .post(repo, pr_number, &failure_message(&e, elapsed))
                    .await
                {
                    tracing::error!(error = %notify_err, "Errored trying to add a comment");
                }
                Err(e)
            }
        }
    }

    /// Returns `None` when the PR's head commit didn't touch the module files.
    async fn revendor_pull_request(
        &self,
        notifier: &Notifier<'_>,
        repo: &RepoRef,
        pr_number: u64,
        comment_id: u64,
    ) -> Result<Option<RevendorOutcome>> {
        // Deleting the trigger comment acknowledges it
        notifier.delete(repo, comment_id).await?;
        notifier.post(repo, pr_number, MAY_NEED_REVENDOR).await?;

        let pr = self.platform.get_pull_request(repo, pr_number).await?;
        tracing::info!(pr = pr_number, head = %pr.head_ref, "Fetched pull request");

        if !requires_revendor(self.platform.as_ref(), repo, &pr.head_ref).await {
            tracing::info!(repo = %repo, pr = pr_number, "No need to revendor");
            notifier.post(repo, pr_number, NO_REVENDOR_NEEDED).await?;
            return Ok(None);
        }

        match self.revendor.run(repo, &pr.head_ref).await {
            RevendorOutcome::Failed(e) => Err(e),
            outcome => Ok(Some(outcome)),
        }
    }
}
