//! Changelog regeneration.
//!
//! The new release section comes from an external engine command (by
//! default `git-cliff --unreleased --strip all --tag <tag>`). The
//! section is spliced into the existing changelog: any front matter
//! above the header survives, the header is kept, the new section goes
//! on top of the previous releases.

use std::process::Command;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from changelog operations.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// A custom header would be confused with a release section.
    #[error("custom header must not match a release heading or anchor")]
    HeaderLooksLikeRelease,

    /// The changelog engine failed.
    #[error("changelog engine failed: {0}")]
    Engine(String),

    /// Reading or writing the changelog file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for changelog operations.
pub type ChangelogResult<T> = Result<T, ChangelogError>;

/// Start of the most recent release section: an ATX heading with a
/// semver (possibly bracket-linked), or a legacy anchor tag.
static LAST_RELEASE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^#+ \[?[0-9]+\.[0-9]+\.[0-9]+|<a name=)").expect("valid regex")
});

/// Reject headers that the splice would mistake for a release section.
pub fn validate_header(header: &str) -> ChangelogResult<()> {
    if LAST_RELEASE_START.is_match(header) {
        return Err(ChangelogError::HeaderLooksLikeRelease);
    }
    Ok(())
}

/// Ensure the changelog file exists, creating an empty one if needed.
///
/// Returns `true` when the file was created. A dry run reports but
/// never creates.
#[instrument]
pub fn create_if_missing(path: &Utf8Path, dry_run: bool) -> ChangelogResult<bool> {
    if path.is_file() {
        return Ok(false);
    }
    debug!(%path, "changelog missing");
    if !dry_run {
        crate::fsio::write_file(path, "\n", false)?;
    }
    Ok(true)
}

/// Run the changelog engine and capture the new release section.
///
/// `{{tag}}` and `{{version}}` placeholders in the command are replaced
/// before it runs.
#[instrument(skip(command))]
pub fn generate_section(
    command: &str,
    root: &Utf8Path,
    tag: &str,
    version: &str,
) -> ChangelogResult<String> {
    let command = command.replace("{{tag}}", tag).replace("{{version}}", version);
    debug!(%command, "running changelog engine");

    let output = Command::new("sh")
        .args(["-c", &command])
        .current_dir(root.as_std_path())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ChangelogError::Engine(stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Splice a new release section into existing changelog content.
///
/// Front matter (anything above the first line of the header) is kept
/// verbatim, the header follows, then the new section, then every
/// previous release section from the old content.
pub fn splice(old_content: &str, header: &str, new_section: &str) -> String {
    let header_line = header.lines().next().unwrap_or("");
    let front = if header_line.is_empty() {
        ""
    } else {
        old_content
            .find(header_line)
            .map_or("", |idx| &old_content[..idx])
    };
    let previous = LAST_RELEASE_START
        .find(old_content)
        .map_or("", |m| &old_content[m.start()..]);

    let mut result = String::new();
    result.push_str(front);
    result.push_str(header);
    result.push('\n');
    result.push_str(new_section);
    result.push_str(previous);
    // Collapse the trailing blank run to a single newline.
    let trimmed_len = result.trim_end_matches('\n').len();
    result.truncate(trimmed_len);
    result.push('\n');
    result
}
