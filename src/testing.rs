//! Fakes and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::platform::types::{PullRequest, RepoRef};
use crate::platform::Platform;
use crate::workspace::command::{CommandOutput, CommandRunner, Invocation};

pub fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets", "https://github.com/octo/widgets.git")
}

fn repository_json() -> serde_json::Value {
    serde_json::json!({
        "id": 1296269,
        "name": "widgets",
        "full_name": "octo/widgets",
        "owner": { "name": "octo", "login": "octo", "id": 1 },
        "clone_url": "https://github.com/octo/widgets.git",
        "default_branch": "main"
    })
}

pub fn push_payload(git_ref: &str) -> Vec<u8> {
    serde_json::json!({
        "ref": git_ref,
        "before": "0000000000000000000000000000000000000000",
        "after": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
        "repository": repository_json(),
        "commits": [
            { "id": "6dcb09b5b57875f334f61aebed695e2e4193db5e", "message": "bump deps" }
        ]
    })
    .to_string()
    .into_bytes()
}

pub fn comment_payload(action: &str, body: &str, on_pull_request: bool) -> Vec<u8> {
    let mut issue = serde_json::json!({ "number": 42, "title": "Bump deps", "state": "open" });
    if on_pull_request {
        issue["pull_request"] =
            serde_json::json!({ "url": "https://api.github.com/repos/octo/widgets/pulls/42" });
    }
    serde_json::json!({
        "action": action,
        "issue": issue,
        "comment": { "id": 1001, "body": body, "user": { "login": "hubot" } },
        "repository": repository_json()
    })
    .to_string()
    .into_bytes()
}

/// Runner that records invocations instead of spawning processes.
///
/// Commands succeed with empty output unless scripted otherwise, matched by
/// command line prefix.
#[derive(Default)]
pub struct FakeRunner {
    invocations: Mutex<Vec<Invocation>>,
    responses: Vec<(String, String)>,
    failures: Vec<(String, String)>,
    timeouts: Vec<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prefix: &str, stdout: &str) -> Self {
        self.responses.push((prefix.to_string(), stdout.to_string()));
        self
    }

    pub fn fail_on(mut self, prefix: &str, output: &str) -> Self {
        self.failures.push((prefix.to_string(), output.to_string()));
        self
    }

    pub fn time_out_on(mut self, prefix: &str) -> Self {
        self.timeouts.push(prefix.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.invocations().iter().map(Invocation::display).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation, deadline: Instant) -> Result<CommandOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let line = invocation.display();

        if self.timeouts.iter().any(|p| line.starts_with(p.as_str())) {
            return Err(AppError::CommandTimeout {
                command: line,
                timeout: deadline.saturating_duration_since(Instant::now()),
            });
        }
        let failure = self
            .failures
            .iter()
            .find(|(p, _)| line.starts_with(p.as_str()));
        if let Some((_, output)) = failure {
            return Err(AppError::Command {
                command: line,
                status: "1".to_string(),
                output: output.clone(),
            });
        }
        let stdout = self
            .responses
            .iter()
            .find(|(p, _)| line.starts_with(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();

        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    GetCommitFiles { git_ref: String },
    GetPullRequest { number: u64 },
    PostComment { number: u64, body: String },
    DeleteComment { comment_id: u64 },
}

/// In-memory hosting API that records every call.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<PlatformCall>>,
    commit_files: HashMap<String, Vec<String>>,
    head_ref: Option<String>,
    fail_commit_lookup: bool,
    fail_post: bool,
    fail_post_at: Option<usize>,
    fail_delete: bool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit_files(mut self, git_ref: &str, files: &[&str]) -> Self {
        self.commit_files.insert(
            git_ref.to_string(),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_pull_request_head(mut self, head_ref: &str) -> Self {
        self.head_ref = Some(head_ref.to_string());
        self
    }

    pub fn failing_commit_lookup(mut self) -> Self {
        self.fail_commit_lookup = true;
        self
    }

    pub fn failing_post(mut self) -> Self {
        self.fail_post = true;
        self
    }

    /// Fail only the `n`th posted comment, counting from 1.
    pub fn failing_post_at(mut self, n: usize) -> Self {
        self.fail_post_at = Some(n);
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posted_comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::PostComment { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn get_commit_files(&self, _repo: &RepoRef, git_ref: &str) -> Result<Vec<String>> {
        self.record(PlatformCall::GetCommitFiles {
            git_ref: git_ref.to_string(),
        });
        if self.fail_commit_lookup {
            return Err(AppError::GitHubApi("Failed to get commit: 502 Bad Gateway".to_string()));
        }
        self.commit_files
            .get(git_ref)
            .cloned()
            .ok_or_else(|| AppError::GitHubApi(format!("No commit found for SHA: {git_ref}")))
    }

    async fn get_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<PullRequest> {
        self.record(PlatformCall::GetPullRequest { number });
        let head_ref = self
            .head_ref
            .clone()
            .ok_or_else(|| AppError::GitHubApi("Not Found".to_string()))?;
        Ok(PullRequest {
            number,
            head_ref,
            head_sha: "6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string(),
        })
    }

    async fn post_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        self.record(PlatformCall::PostComment {
            number,
            body: body.to_string(),
        });
        let nth = self.posted_comments().len();
        if self.fail_post || self.fail_post_at == Some(nth) {
            return Err(AppError::GitHubApi("Failed to create comment: 403 Forbidden".to_string()));
        }
        Ok(())
    }

    async fn delete_comment(&self, _repo: &RepoRef, comment_id: u64) -> Result<()> {
        self.record(PlatformCall::DeleteComment { comment_id });
        if self.fail_delete {
            return Err(AppError::GitHubApi("Failed to delete comment: 404 Not Found".to_string()));
        }
        Ok(())
    }
}
