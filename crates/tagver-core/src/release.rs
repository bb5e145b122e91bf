//! Release orchestration.
//!
//! [`run`] drives the full workflow: resolve the current version, bump
//! it, regenerate the changelog, create the release commit, and tag.
//! Skip flags drop whole phases along with their lifecycle scripts.
//! Terminal-facing progress is reported through [`ReleaseEvent`]s so
//! the core stays silent and the binary decides how to render.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use thiserror::Error;
use tracing::{info, instrument};

use crate::bump::{self, BumpError, UpdatedFiles};
use crate::changelog::{self, ChangelogError};
use crate::config::Config;
use crate::git::{self, CommitOptions, GitError};
use crate::hooks::{self, Hook, HookError};
use crate::version::Prerelease;

/// Errors from the release workflow.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The bump phase failed.
    #[error(transparent)]
    Bump(#[from] BumpError),

    /// The changelog phase failed.
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A lifecycle script failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// An I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for release operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Figure drawn in front of a checkpoint line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Figure {
    /// A completed step (yellow instead of green during a dry run).
    Tick,
    /// A step deliberately not performed.
    Cross,
    /// Informational, such as the publish hint.
    Info,
}

/// Progress events emitted while the workflow runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseEvent {
    /// One step of the workflow, rendered as a checkpoint line.
    Checkpoint {
        /// Figure to draw in front of the message.
        figure: Figure,
        /// Human-readable step description.
        message: String,
    },
    /// A non-fatal problem worth surfacing.
    Warning(String),
    /// The generated changelog section, shown instead of written
    /// during a dry run.
    ChangelogPreview(String),
}

/// Event callback used throughout the workflow.
pub type EventSink<'a> = dyn FnMut(ReleaseEvent) + 'a;

pub(crate) fn checkpoint(on_event: &mut EventSink<'_>, figure: Figure, message: String) {
    on_event(ReleaseEvent::Checkpoint { figure, message });
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflow
// ─────────────────────────────────────────────────────────────────────────────

/// What a completed (or dry) run did.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    /// The version before the run.
    pub previous: Version,
    /// The released version.
    pub version: Version,
    /// The release tag, prefix included.
    pub tag: String,
    /// Files whose version strings were rewritten.
    pub updated_files: Vec<Utf8PathBuf>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Run the release workflow in `root`.
///
/// `root` must also be the process working directory so that git
/// commands and relative paths agree.
#[instrument(skip_all, fields(root = %root))]
pub fn run(
    root: &Utf8Path,
    config: &Config,
    on_event: &mut EventSink<'_>,
) -> ReleaseResult<ReleaseOutcome> {
    changelog::validate_header(&config.header)?;

    let pkg = bump::package_info(config, root, on_event)?;
    info!(current = %pkg.version, "resolved current version");

    let bumped = bump::run(config, root, &pkg.version, on_event)?;
    let tag = format!("{}{}", config.tag_prefix, bumped.new_version);

    changelog_phase(config, root, &bumped.new_version, &tag, on_event)?;
    commit_phase(config, root, &bumped.new_version, &bumped.updated, on_event)?;
    tag_phase(config, root, &bumped.new_version, pkg.private, &bumped.updated, on_event)?;

    info!(version = %bumped.new_version, %tag, "release complete");
    Ok(ReleaseOutcome {
        previous: pkg.version,
        version: bumped.new_version,
        tag,
        updated_files: bumped.updated.into_paths(),
        dry_run: config.dry_run,
    })
}

/// Run one lifecycle script, if configured.
///
/// Reports the script and its command as checkpoints, skips execution
/// during a dry run, and surfaces stderr of a successful script as a
/// warning. Returns captured stdout.
pub(crate) fn run_script(
    config: &Config,
    root: &Utf8Path,
    hook: Hook,
    on_event: &mut EventSink<'_>,
) -> Result<Option<String>, HookError> {
    let Some(command) = config.scripts.get(hook) else {
        return Ok(None);
    };
    checkpoint(
        on_event,
        Figure::Tick,
        format!("Running lifecycle script \"{hook}\""),
    );
    checkpoint(
        on_event,
        Figure::Info,
        format!("- execute command: \"{command}\""),
    );
    if config.dry_run {
        return Ok(None);
    }
    let output = hooks::run(hook, command, root)?;
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        on_event(ReleaseEvent::Warning(stderr.to_string()));
    }
    Ok(Some(output.stdout))
}

/// Replace `{{currentTag}}` with the new version.
pub fn format_commit_message(format: &str, version: &Version) -> String {
    format.replace("{{currentTag}}", &version.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Changelog phase
// ─────────────────────────────────────────────────────────────────────────────

fn changelog_phase(
    config: &Config,
    root: &Utf8Path,
    new_version: &Version,
    tag: &str,
    on_event: &mut EventSink<'_>,
) -> ReleaseResult<()> {
    if config.skip.changelog {
        return Ok(());
    }
    run_script(config, root, Hook::Prechangelog, on_event)?;

    let infile = root.join(&config.infile);
    if changelog::create_if_missing(&infile, config.dry_run)? {
        checkpoint(on_event, Figure::Tick, format!("created {}", config.infile));
    }
    checkpoint(
        on_event,
        Figure::Tick,
        format!("outputting changes to {}", config.infile),
    );

    let section = changelog::generate_section(
        config.commands.changelog_command(),
        root,
        tag,
        &new_version.to_string(),
    )?;

    if config.dry_run {
        on_event(ReleaseEvent::ChangelogPreview(section.trim().to_string()));
    } else {
        // release_count of zero rebuilds the whole file from the
        // engine output alone.
        let old = if config.release_count == 0 {
            String::new()
        } else {
            std::fs::read_to_string(&infile).unwrap_or_default()
        };
        let content = changelog::splice(&old, &config.header, &section);
        crate::fsio::write_file(&infile, &content, false)?;
    }

    run_script(config, root, Hook::Postchangelog, on_event)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Commit phase
// ─────────────────────────────────────────────────────────────────────────────

fn commit_phase(
    config: &Config,
    root: &Utf8Path,
    new_version: &Version,
    updated: &UpdatedFiles,
    on_event: &mut EventSink<'_>,
) -> ReleaseResult<()> {
    if config.skip.commit {
        return Ok(());
    }
    // Precommit stdout overrides the message format for this phase only.
    let override_format = run_script(config, root, Hook::Precommit, on_event)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let message_format = override_format
        .as_deref()
        .unwrap_or(&config.release_commit_message_format);

    let mut to_add: Vec<String> = Vec::new();
    let mut shown: Vec<String> = Vec::new();
    if !config.skip.changelog {
        to_add.push(config.infile.to_string());
        shown.push(config.infile.to_string());
    }
    for path in updated.iter() {
        to_add.push(path.to_string());
        shown.insert(0, path.to_string());
    }
    if config.commit_all {
        shown.push("all staged files".to_string());
    }
    checkpoint(
        on_event,
        Figure::Tick,
        format!("committing {}", shown.join(" and ")),
    );

    // Nothing to commit: every contributing phase was skipped.
    if !config.commit_all && config.skip.changelog && config.skip.bump && to_add.is_empty() {
        return Ok(());
    }

    if !config.dry_run {
        let paths: Vec<&str> = to_add.iter().map(String::as_str).collect();
        if !paths.is_empty() {
            git::add(&paths)?;
        }
        git::commit(
            &format_commit_message(message_format, new_version),
            &CommitOptions {
                sign: config.sign,
                no_verify: config.no_verify,
                signoff: config.signoff,
                all: config.commit_all,
                paths: &paths,
            },
        )?;
    }

    run_script(config, root, Hook::Postcommit, on_event)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag phase
// ─────────────────────────────────────────────────────────────────────────────

fn tag_phase(
    config: &Config,
    root: &Utf8Path,
    new_version: &Version,
    pkg_private: bool,
    updated: &UpdatedFiles,
    on_event: &mut EventSink<'_>,
) -> ReleaseResult<()> {
    if config.skip.tag {
        return Ok(());
    }
    run_script(config, root, Hook::Pretag, on_event)?;

    let tag = format!("{}{}", config.tag_prefix, new_version);
    checkpoint(on_event, Figure::Tick, format!("tagging release {tag}"));
    if !config.dry_run {
        git::create_tag(
            &tag,
            &format_commit_message(&config.release_commit_message_format, new_version),
            config.sign,
            config.tag_force,
        )?;
    }

    let branch = if config.dry_run {
        git::current_branch().ok().flatten()
    } else {
        git::current_branch()?
    }
    .unwrap_or_else(|| "HEAD".to_string());

    let mut push_hint = format!("git push --follow-tags origin {branch}");
    if !pkg_private && updated.contains("package.json") {
        let publish = config
            .npm_publish_hint
            .clone()
            .unwrap_or_else(|| format!("{} publish", detect_package_manager(root)));
        push_hint.push_str(" && ");
        push_hint.push_str(&publish);
        match &config.prerelease {
            Prerelease::Off => {}
            Prerelease::Unnamed => push_hint.push_str(" --tag prerelease"),
            Prerelease::Named(id) => {
                push_hint.push_str(" --tag ");
                push_hint.push_str(id);
            }
        }
    }
    checkpoint(
        on_event,
        Figure::Info,
        format!("Run `{push_hint}` to publish"),
    );

    run_script(config, root, Hook::Posttag, on_event)?;
    Ok(())
}

/// Pick a package manager for the publish hint based on lock files.
fn detect_package_manager(root: &Utf8Path) -> &'static str {
    if root.join("yarn.lock").is_file() {
        "yarn"
    } else if root.join("pnpm-lock.yaml").is_file() {
        "pnpm"
    } else {
        "npm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn commit_message_formatting() {
        let v = Version::new(1, 2, 3);
        assert_eq!(
            format_commit_message("chore(release): {{currentTag}}", &v),
            "chore(release): 1.2.3"
        );
        assert_eq!(format_commit_message("no placeholder", &v), "no placeholder");
        assert_eq!(
            format_commit_message("{{currentTag}} and {{currentTag}}", &v),
            "1.2.3 and 1.2.3"
        );
    }

    #[test]
    fn package_manager_detection() {
        let (_tmp, root) = temp_root();
        assert_eq!(detect_package_manager(&root), "npm");
        std::fs::write(root.join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(detect_package_manager(&root), "pnpm");
        std::fs::write(root.join("yarn.lock"), "").unwrap();
        assert_eq!(detect_package_manager(&root), "yarn");
    }

    #[test]
    fn run_script_reports_and_captures() {
        let (_tmp, root) = temp_root();
        let config = Config {
            scripts: crate::config::Scripts {
                prebump: Some("echo 9.9.9".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut events = Vec::new();
        let out = run_script(&config, &root, Hook::Prebump, &mut |e| events.push(e)).unwrap();
        assert_eq!(out.as_deref().map(str::trim), Some("9.9.9"));
        assert!(matches!(
            events[0],
            ReleaseEvent::Checkpoint { figure: Figure::Tick, ref message }
                if message.contains("prebump")
        ));
    }

    #[test]
    fn run_script_skips_execution_in_dry_run() {
        let (_tmp, root) = temp_root();
        let config = Config {
            dry_run: true,
            scripts: crate::config::Scripts {
                pretag: Some("exit 1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut events = Vec::new();
        // The failing command is never executed.
        let out = run_script(&config, &root, Hook::Pretag, &mut |e| events.push(e)).unwrap();
        assert!(out.is_none());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn run_script_warns_on_stderr() {
        let (_tmp, root) = temp_root();
        let config = Config {
            scripts: crate::config::Scripts {
                postbump: Some("echo careful >&2".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut events = Vec::new();
        run_script(&config, &root, Hook::Postbump, &mut |e| events.push(e)).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ReleaseEvent::Warning(w) if w == "careful")));
    }

    #[test]
    fn unconfigured_script_is_silent() {
        let (_tmp, root) = temp_root();
        let config = Config::default();
        let mut events = Vec::new();
        let out = run_script(&config, &root, Hook::Posttag, &mut |e| events.push(e)).unwrap();
        assert!(out.is_none());
        assert!(events.is_empty());
    }
}
