use crate::error::{AppError, Result};
use crate::platform::types::RepoRef;
use crate::platform::Platform;

/// Posts and removes status comments on a conversation.
pub struct Notifier<'a> {
    platform: &'a dyn Platform,
}

impl<'a> Notifier<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    pub async fn post(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        self.platform
            .post_comment(repo, number, body)
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;
        tracing::info!(repo = %repo, number, "Added comment");
        Ok(())
    }

    pub async fn delete(&self, repo: &RepoRef, comment_id: u64) -> Result<()> {
        self.platform
            .delete_comment(repo, comment_id)
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;
        tracing::info!(repo = %repo, comment_id, "Deleted comment");
        Ok(())
    }
}
