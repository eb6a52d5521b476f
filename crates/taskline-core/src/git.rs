//! Git collaborator used when starting a task.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

/// Version-control capability the lifecycle manager depends on.
pub trait VersionControl {
    fn is_repository(&self) -> bool;
    fn has_uncommitted_changes(&self) -> Result<bool, GitError>;
    fn create_and_switch_branch(&self, name: &str) -> Result<(), GitError>;
    fn current_branch(&self) -> Option<String>;
}

/// Shells out to the `git` binary for a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.workdir);
        cmd
    }
}

impl VersionControl for GitCli {
    fn is_repository(&self) -> bool {
        if which::which("git").is_err() {
            return false;
        }
        let output = match self.git().args(["rev-parse", "--is-inside-work-tree"]).output() {
            Ok(output) => output,
            Err(_) => return false,
        };
        output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true"
    }

    fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        let output = self.git().args(["status", "--porcelain"]).output()?;
        if !output.status.success() {
            return Err(GitError::Command {
                command: "status --porcelain".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    fn create_and_switch_branch(&self, name: &str) -> Result<(), GitError> {
        let output = self.git().args(["checkout", "-b", name]).output()?;
        if !output.status.success() {
            return Err(GitError::Command {
                command: format!("checkout -b {name}"),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!(branch = name, "created and switched branch");
        Ok(())
    }

    fn current_branch(&self) -> Option<String> {
        let output = self
            .git()
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if raw.is_empty() || raw == "HEAD" {
            None
        } else {
            Some(raw)
        }
    }
}
