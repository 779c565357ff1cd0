use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    #[error("Failed to parse webhook event: {0}")]
    Parse(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Workspace error ({stage}): {message}")]
    Workspace {
        stage: WorkspaceStage,
        message: String,
    },

    #[error("`{command}` failed with status {status}:\n{output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("Failed to notify: {0}")]
    Notify(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The step of a checkout that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceStage {
    CreateDir,
    Clone,
    Checkout,
}

impl std::fmt::Display for WorkspaceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkspaceStage::CreateDir => "create directory",
            WorkspaceStage::Clone => "clone",
            WorkspaceStage::Checkout => "checkout",
        };
        f.write_str(name)
    }
}

impl AppError {
    pub(crate) fn workspace(stage: WorkspaceStage, cause: impl std::fmt::Display) -> Self {
        AppError::Workspace {
            stage,
            message: cause.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
