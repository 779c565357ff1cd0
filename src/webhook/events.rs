use serde::Deserialize;

use crate::platform::types::RepoRef;

/// Top-level webhook event parsed from the payload based on X-GitHub-Event header.
#[derive(Debug)]
pub enum WebhookEvent {
    Push(PushEvent),
    IssueComment(IssueCommentEvent),
    Ping,
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub repository: RepositoryPayload,
    #[serde(default)]
    pub commits: Vec<CommitPayload>,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: IssuePayload,
    pub comment: CommentPayload,
    pub repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    pub pull_request: Option<serde_json::Value>, // Present if issue is a PR
}

impl IssuePayload {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.as_ref().is_some_and(|pr| !pr.is_null())
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub id: u64,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitPayload {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub owner: OwnerPayload,
    pub clone_url: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerPayload {
    pub login: String,
}

impl RepositoryPayload {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner.login, &self.name, &self.clone_url)
    }
}

impl WebhookEvent {
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            "push" => {
                let event: PushEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::Push(event))
            }
            "issue_comment" => {
                let event: IssueCommentEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::IssueComment(event))
            }
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unsupported(other.to_string())),
        }
    }
}
