use async_trait::async_trait;
use octocrab::models::CommentId;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

pub struct GitHubPlatform {
    client: Octocrab,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(AppError::Config("GitHub token is empty".to_string()));
        }

        let mut builder = Octocrab::builder().personal_token(config.token.clone());
        if let Some(api_url) = config.api_url.as_deref() {
            builder = builder
                .base_uri(api_url)
                .map_err(|e| AppError::Config(format!("Invalid GitHub API URL {api_url}: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self { client })
    }
}

/// Each ref segment is escaped on its own so `refs/heads/...` keeps its slashes
/// while `#`, `%` and `?` in branch names stay part of the path.
fn commit_path(repo: &RepoRef, git_ref: &str) -> String {
    let escaped: Vec<_> = git_ref.split('/').map(urlencoding::encode).collect();
    format!(
        "/repos/{}/{}/commits/{}",
        urlencoding::encode(&repo.owner),
        urlencoding::encode(&repo.name),
        escaped.join("/")
    )
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn get_commit_files(&self, repo: &RepoRef, git_ref: &str) -> Result<Vec<String>> {
        // octocrab's commit model doesn't expose the file list, use the API directly
        let url = commit_path(repo, git_ref);
        let commit: mapper::CommitPayload = self
            .client
            .get(&url, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to get commit {git_ref}: {e}")))?;

        Ok(mapper::map_commit_files(commit))
    }

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&repo.owner, &repo.name)
            .get(number)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to get PR #{number}: {e}")))?;

        Ok(mapper::map_pull_request(pr))
    }

    async fn post_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        // Even on a PR this is an issue comment; PR comments are review comments.
        self.client
            .issues(&repo.owner, &repo.name)
            .create_comment(number, body)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to create comment: {e}")))?;

        Ok(())
    }

    async fn delete_comment(&self, repo: &RepoRef, comment_id: u64) -> Result<()> {
        self.client
            .issues(&repo.owner, &repo.name)
            .delete_comment(CommentId(comment_id))
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to delete comment: {e}")))?;

        Ok(())
    }
}
