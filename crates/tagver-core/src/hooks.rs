//! Lifecycle script execution.
//!
//! Lifecycle scripts are user-configured shell commands that run at
//! phase boundaries of the release workflow. Each phase has a pre and a
//! post script; skipping a phase skips its scripts too. Two scripts
//! feed their stdout back into the run: `prebump` output overrides the
//! release-as setting, and `precommit` output overrides the commit
//! message format.

use std::process::Command;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from lifecycle script execution.
#[derive(Error, Debug)]
pub enum HookError {
    /// A script exited with a non-zero status.
    #[error("{hook} script failed: {command}")]
    CommandFailed {
        /// Which lifecycle hook failed.
        hook: Hook,
        /// The command that failed.
        command: String,
        /// The exit code, if available.
        exit_code: Option<i32>,
        /// Captured stderr.
        stderr: String,
    },

    /// Failed to spawn a script.
    #[error("failed to execute script: {0}")]
    Exec(#[from] std::io::Error),
}

/// Result alias for lifecycle script operations.
pub type HookResult<T> = Result<T, HookError>;

/// The lifecycle hooks, in the order they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Before anything else in the bump phase.
    Prerelease,
    /// Before the version is computed; stdout overrides release-as.
    Prebump,
    /// After version strings are rewritten.
    Postbump,
    /// Before the changelog is regenerated.
    Prechangelog,
    /// After the changelog is written.
    Postchangelog,
    /// Before the release commit; stdout overrides the message format.
    Precommit,
    /// After the release commit.
    Postcommit,
    /// Before the release tag.
    Pretag,
    /// After the release tag.
    Posttag,
}

impl Hook {
    /// The hook's name as it appears under `scripts` in config.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prerelease => "prerelease",
            Self::Prebump => "prebump",
            Self::Postbump => "postbump",
            Self::Prechangelog => "prechangelog",
            Self::Postchangelog => "postchangelog",
            Self::Precommit => "precommit",
            Self::Postcommit => "postcommit",
            Self::Pretag => "pretag",
            Self::Posttag => "posttag",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one lifecycle script.
#[derive(Debug, Clone)]
pub struct HookOutput {
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr. Non-empty stderr from a successful script is a
    /// warning, never fatal.
    pub stderr: String,
    /// How long the script took to run.
    pub duration: Duration,
}

/// Run one lifecycle script through the shell.
#[instrument]
pub fn run(hook: Hook, command: &str, project_root: &Utf8Path) -> HookResult<HookOutput> {
    debug!(%hook, %command, "running lifecycle script");

    let start = Instant::now();
    let output = Command::new("sh")
        .args(["-c", command])
        .current_dir(project_root.as_std_path())
        .output()?;
    let duration = start.elapsed();

    if !output.status.success() {
        return Err(HookError::CommandFailed {
            hook,
            command: command.to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(HookOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration,
    })
}
