use serde::Deserialize;

use crate::platform::types;

/// The parts of `GET /repos/{owner}/{repo}/commits/{ref}` we read.
#[derive(Debug, Deserialize)]
pub struct CommitPayload {
    #[serde(default)]
    pub files: Vec<CommitFilePayload>,
}

#[derive(Debug, Deserialize)]
pub struct CommitFilePayload {
    pub filename: String,
}

pub fn map_commit_files(commit: CommitPayload) -> Vec<String> {
    commit.files.into_iter().map(|f| f.filename).collect()
}

/// Map octocrab PullRequest to our platform PullRequest type.
pub fn map_pull_request(pr: octocrab::models::pulls::PullRequest) -> types::PullRequest {
    types::PullRequest {
        number: pr.number,
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
    }
}
