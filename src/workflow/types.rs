use crate::error::AppError;

/// Outcome of a revendor run.
#[derive(Debug)]
pub enum RevendorOutcome {
    /// `go mod tidy` and `go mod vendor` left the working tree clean.
    NoChangeNeeded,
    /// Regenerated files were committed and pushed.
    Committed,
    /// A step failed; nothing was pushed.
    Failed(AppError),
}
