//! Git operations for the release workflow.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, GPG signing, hooks, and other configuration.

use std::process::Command;

use camino::Utf8Path;
use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::version::parse_version;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "commit").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Check if we're inside a git repository.
#[instrument]
pub fn is_inside_repo() -> GitResult<bool> {
    let result = git(&["rev-parse", "--is-inside-work-tree"]);
    match result {
        Ok(output) => Ok(output.trim() == "true"),
        Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Get the current branch name.
///
/// Returns `None` if in a detached HEAD state.
#[instrument]
pub fn current_branch() -> GitResult<Option<String>> {
    let output = git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    let branch = output.trim().to_string();
    if branch == "HEAD" {
        debug!("detached HEAD");
        Ok(None)
    } else {
        debug!(%branch, "current branch");
        Ok(Some(branch))
    }
}

/// All tags under the configured prefix that parse as semver, in no
/// particular order.
#[instrument]
pub fn semver_tags(tag_prefix: &str) -> GitResult<Vec<Version>> {
    let pattern = format!("{tag_prefix}*");
    let output = git(&["tag", "--list", &pattern])?;

    let versions: Vec<Version> = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(tag_prefix))
        .filter_map(|rest| parse_version(rest).ok())
        .collect();
    debug!(count = versions.len(), "semver tags");
    Ok(versions)
}

/// The highest semver tag under the prefix, or `1.0.0` when no tag
/// parses. The fallback keeps tag-only projects working on their first
/// run with existing history.
#[instrument]
pub fn latest_semver_tag(tag_prefix: &str) -> GitResult<Version> {
    let latest = semver_tags(tag_prefix)?.into_iter().max();
    match latest {
        Some(v) => Ok(v),
        None => {
            debug!("no semver tags, falling back to 1.0.0");
            Ok(Version::new(1, 0, 0))
        }
    }
}

/// Whether a path is ignored by the repository's ignore rules.
///
/// Outside a repository nothing counts as ignored.
#[instrument]
pub fn is_ignored(path: &Utf8Path) -> GitResult<bool> {
    let status = Command::new("git")
        .args(["check-ignore", "-q", "--", path.as_str()])
        .stderr(std::process::Stdio::null())
        .status()?;
    // Exit 0 means ignored, 1 means not ignored, 128 means no repo.
    Ok(status.code() == Some(0))
}

/// Stage the given paths.
#[instrument]
pub fn add(paths: &[&str]) -> GitResult<()> {
    let mut args = vec!["add", "--"];
    args.extend_from_slice(paths);
    git(&args)?;
    Ok(())
}

/// Options for [`commit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions<'a> {
    /// Pass `-S` to sign the commit.
    pub sign: bool,
    /// Pass `--no-verify` to skip commit hooks.
    pub no_verify: bool,
    /// Pass `--signoff` to add a Signed-off-by trailer.
    pub signoff: bool,
    /// Commit all tracked changes (`-a`) instead of listed paths.
    pub all: bool,
    /// Paths to commit when `all` is false.
    pub paths: &'a [&'a str],
}

/// Create the release commit.
#[instrument(skip(options))]
pub fn commit(message: &str, options: &CommitOptions<'_>) -> GitResult<()> {
    let mut args = vec!["commit"];
    if options.sign {
        args.push("-S");
    }
    if options.no_verify {
        args.push("--no-verify");
    }
    if options.signoff {
        args.push("--signoff");
    }
    if options.all {
        args.push("-a");
    }
    args.extend(["-m", message]);
    if !options.all {
        args.push("--");
        args.extend_from_slice(options.paths);
    }
    git(&args)?;
    Ok(())
}

/// Create an annotated (or signed) release tag.
#[instrument]
pub fn create_tag(name: &str, message: &str, sign: bool, force: bool) -> GitResult<()> {
    let mut args = vec!["tag"];
    args.push(if sign { "-s" } else { "-a" });
    if force {
        args.push("-f");
    }
    args.extend([name, "-m", message]);
    git(&args)?;
    Ok(())
}

/// Run a git command and return its stdout.
fn git(args: &[&str]) -> GitResult<String> {
    let output = Command::new("git").args(args).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        // Detect "not a git repo" specifically
        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        Err(GitError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}
