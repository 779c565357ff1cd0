use crate::platform::types::RepoRef;
use crate::platform::Platform;

/// Files whose modification means `vendor/` may be stale.
pub const MANIFEST_FILES: [&str; 2] = ["go.mod", "go.sum"];

/// Whether the commit at `git_ref` touched a module manifest at the repo root.
///
/// API failures are logged and treated as "no": a missed revendor is
/// preferred over failing the delivery, and the user can retrigger with a
/// comment.
pub async fn requires_revendor(platform: &dyn Platform, repo: &RepoRef, git_ref: &str) -> bool {
    let files = match platform.get_commit_files(repo, git_ref).await {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(repo = %repo, git_ref, error = %e, "Failed to get commit, ignoring");
            return false;
        }
    };

    let touched = files
        .iter()
        .any(|file| MANIFEST_FILES.contains(&file.as_str()));
    tracing::info!(
        repo = %repo,
        git_ref,
        files = files.len(),
        touched,
        "Checked commit for module manifest changes"
    );
    touched
}
