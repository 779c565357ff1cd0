pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// The slice of the hosting API the bot needs.
///
/// Implementations treat any response status of 300 or above as an error.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Names of the files touched by a commit. `git_ref` may be a SHA or a ref.
    async fn get_commit_files(&self, repo: &RepoRef, git_ref: &str) -> Result<Vec<String>>;

    /// Fetch a pull request.
    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest>;

    /// Post a comment on an issue or PR.
    async fn post_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;

    /// Delete an issue or PR comment.
    async fn delete_comment(&self, repo: &RepoRef, comment_id: u64) -> Result<()>;
}
