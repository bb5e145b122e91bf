//! Recommended-bump engine.
//!
//! Delegates to an external command (by default `git-cliff
//! --bumped-version`) to inspect the conventional-commit history and
//! recommend a bump level. The command may print either a bump keyword
//! (`major`/`minor`/`patch`) or a bumped version, which is diffed
//! against the current version to recover the level.

use std::process::Command;

use camino::Utf8Path;
use semver::Version;
use tracing::{debug, instrument};

use crate::version::{ReleaseType, VersionError, VersionResult, parse_version};

/// Ask the configured engine for the recommended bump level.
#[instrument(skip(current))]
pub fn recommended_bump(
    root: &Utf8Path,
    command: &str,
    current: &Version,
) -> VersionResult<ReleaseType> {
    debug!(%command, "consulting bump engine");

    let output = Command::new("sh")
        .args(["-c", command])
        .current_dir(root)
        .output()
        .map_err(|e| VersionError::EngineFailed {
            engine: command.to_string(),
            message: format!("failed to execute: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VersionError::EngineFailed {
            engine: command.to_string(),
            message: stderr,
        });
    }

    let suggestion = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(%suggestion, "bump engine output");
    interpret(&suggestion, current)
}

/// Interpret engine output as a keyword or as a bumped version.
fn interpret(suggestion: &str, current: &Version) -> VersionResult<ReleaseType> {
    if let Ok(level) = suggestion.parse::<ReleaseType>() {
        return Ok(level);
    }
    let bumped = parse_version(suggestion)
        .map_err(|_| VersionError::EngineOutput(suggestion.to_string()))?;
    Ok(level_between(current, &bumped))
}

fn level_between(current: &Version, bumped: &Version) -> ReleaseType {
    if bumped.major != current.major {
        ReleaseType::Major
    } else if bumped.minor != current.minor {
        ReleaseType::Minor
    } else {
        ReleaseType::Patch
    }
}
