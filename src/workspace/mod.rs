pub mod command;
pub mod git;
pub mod manager;

pub use manager::{Workspace, WorkspaceManager};
