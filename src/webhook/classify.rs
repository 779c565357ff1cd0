use crate::error::Result;
use crate::platform::types::RepoRef;
use crate::webhook::events::{IssueCommentEvent, WebhookEvent};

/// The comment that asks the bot to revendor a pull request.
pub const TRIGGER_COMMAND: &str = "/revendor";

/// What the bot should do about an incoming event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ignore,
    EvaluatePush {
        git_ref: String,
        repo: RepoRef,
    },
    EvaluateComment {
        repo: RepoRef,
        pr_number: u64,
        comment_id: u64,
    },
}

/// Parse a delivery and decide what to do with it.
///
/// Unknown event types and comments that don't ask for a revendor are
/// ignored; only undecodable payloads are errors.
pub fn classify(event_type: &str, payload: &[u8]) -> Result<Action> {
    let event = WebhookEvent::parse(event_type, payload)?;

    let action = match event {
        WebhookEvent::Push(push) => {
            tracing::info!(
                git_ref = %push.ref_name,
                commits = push.commits.len(),
                "Received push"
            );
            Action::EvaluatePush {
                repo: push.repository.repo_ref(),
                git_ref: push.ref_name,
            }
        }
        WebhookEvent::IssueComment(comment) => {
            if !is_revendor_request(&comment) {
                tracing::debug!(
                    action = %comment.action,
                    issue = comment.issue.number,
                    "Ignoring comment"
                );
                return Ok(Action::Ignore);
            }
            Action::EvaluateComment {
                repo: comment.repository.repo_ref(),
                pr_number: comment.issue.number,
                comment_id: comment.comment.id,
            }
        }
        WebhookEvent::Ping => {
            tracing::info!("Received ping event");
            Action::Ignore
        }
        WebhookEvent::Unsupported(event_type) => {
            tracing::info!(event_type = %event_type, "Ignoring unsupported event");
            Action::Ignore
        }
    };

    Ok(action)
}

fn is_revendor_request(event: &IssueCommentEvent) -> bool {
    event.action == "created"
        && event.comment.body.as_deref().unwrap_or_default().trim() == TRIGGER_COMMAND
        && event.issue.is_pull_request()
}
