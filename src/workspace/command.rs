use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::Instant;

use crate::error::{AppError, Result};

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I, dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: dir.to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// The command line as it would be typed, for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs.
///
/// A run that exits non-zero is an `AppError::Command`; one that is still
/// running at `deadline` is killed and reported as `AppError::CommandTimeout`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, deadline: Instant) -> Result<CommandOutput>;
}

/// Runs invocations as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, deadline: Instant) -> Result<CommandOutput> {
        let command_line = invocation.display();
        tracing::debug!(
            command = %command_line,
            dir = %invocation.dir.display(),
            "Running command"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.dir)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must take the child down with it.
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| AppError::Command {
            command: command_line.clone(),
            status: "not started".to_string(),
            output: e.to_string(),
        })?;

        let started = Instant::now();
        let output = tokio::time::timeout_at(deadline, child.wait_with_output())
            .await
            .map_err(|_| AppError::CommandTimeout {
                command: command_line.clone(),
                timeout: started.elapsed(),
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            tracing::warn!(command = %command_line, status = %status, "Command failed");
            return Err(AppError::Command {
                command: command_line,
                status,
                output: combine_output(&stdout, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn combine_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim(), stderr.trim()) {
        ("", "") => "(no output)".to_string(),
        (out, "") => out.to_string(),
        ("", err) => err.to_string(),
        (out, err) => format!("{out}\n{err}"),
    }
}
