//! Version bump phase.
//!
//! Resolves the current version from the package files (or the latest
//! tag), computes the next one, and rewrites the version string in
//! every bump target. The files actually rewritten are collected in an
//! [`UpdatedFiles`] registry that the commit and tag phases consume.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::git::{self, GitError};
use crate::hooks::{Hook, HookError};
use crate::release::{EventSink, Figure, ReleaseEvent, checkpoint, run_script};
use crate::updaters::resolve_updater;
use crate::version::resolve::{self, ResolveRequest};
use crate::version::{ReleaseAs, VersionError, conventional, parse_version};

/// Errors from the bump phase.
#[derive(Error, Debug)]
pub enum BumpError {
    /// Version parsing or resolution failed.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A lifecycle script failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// No package file holds a version and the tag fallback is off.
    #[error("no version found in package files, and git tag fallback is disabled")]
    NoVersionSource,

    /// An I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

/// The current version and whether the package is private.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    /// The version the project is currently at.
    pub version: Version,
    /// Private packages never get a publish hint.
    pub private: bool,
}

/// Files whose version strings a run has rewritten.
///
/// Threaded explicitly from the bump phase into the commit phase (for
/// staging) and the tag phase (for the publish hint).
#[derive(Debug, Default, Clone)]
pub struct UpdatedFiles {
    files: Vec<Utf8PathBuf>,
}

impl UpdatedFiles {
    fn record(&mut self, path: Utf8PathBuf) {
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Iterate over the recorded paths.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.files.iter().map(Utf8PathBuf::as_path)
    }

    /// Whether a path was recorded, as spelled in the file spec.
    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }

    /// Whether any file was rewritten.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume the registry into its paths.
    pub fn into_paths(self) -> Vec<Utf8PathBuf> {
        self.files
    }
}

/// What the bump phase produced.
#[derive(Debug)]
pub struct BumpOutcome {
    /// The version the rest of the workflow releases.
    pub new_version: Version,
    /// Files rewritten with the new version.
    pub updated: UpdatedFiles,
}

/// Resolve the current version from the package files.
///
/// The first file that yields a readable version wins. When none does,
/// the highest existing semver tag is used (if `git_tag_fallback` is
/// on), defaulting to `1.0.0` in a repository without version tags.
#[instrument(skip_all)]
pub fn package_info(
    config: &Config,
    root: &Utf8Path,
    on_event: &mut EventSink<'_>,
) -> BumpResult<PackageInfo> {
    for spec in &config.package_files {
        let binding = match resolve_updater(spec, root) {
            Ok(binding) => binding,
            Err(e) => {
                on_event(ReleaseEvent::Warning(e.to_string()));
                continue;
            }
        };
        let path = root.join(&binding.filename);
        if !path.is_file() {
            continue;
        }
        let contents = std::fs::read_to_string(&path)?;
        match binding.read_version(&contents) {
            Ok(raw) => {
                return Ok(PackageInfo {
                    version: parse_version(&raw)?,
                    private: binding.is_private(&contents),
                });
            }
            Err(e) => {
                warn!(file = %binding.filename, error = %e, "unreadable version, trying next package file");
            }
        }
    }

    if config.git_tag_fallback {
        let version = git::latest_semver_tag(&config.tag_prefix)?;
        debug!(%version, "current version from tags");
        Ok(PackageInfo {
            version,
            private: false,
        })
    } else {
        Err(BumpError::NoVersionSource)
    }
}

/// Run the bump phase.
///
/// With `skip.bump` the current version is passed through untouched
/// and no scripts run. Otherwise the `prerelease` and `prebump` hooks
/// fire first; `prebump` stdout that parses as a version becomes an
/// exact release-as override.
#[instrument(skip_all, fields(current = %current))]
pub fn run(
    config: &Config,
    root: &Utf8Path,
    current: &Version,
    on_event: &mut EventSink<'_>,
) -> BumpResult<BumpOutcome> {
    if config.skip.bump {
        return Ok(BumpOutcome {
            new_version: current.clone(),
            updated: UpdatedFiles::default(),
        });
    }

    let mut release_as = config
        .release_as
        .as_deref()
        .map(crate::version::parse_release_as)
        .transpose()?;

    run_script(config, root, Hook::Prerelease, on_event)?;
    if let Some(stdout) = run_script(config, root, Hook::Prebump, on_event)? {
        let cleaned = stdout.trim().replace(['\'', '"'], "");
        if !cleaned.is_empty()
            && let Ok(version) = parse_version(&cleaned)
        {
            debug!(%version, "prebump script overrides release-as");
            release_as = Some(ReleaseAs::Exact(version));
        }
    }

    let mut updated = UpdatedFiles::default();
    let new_version = if config.first_release {
        checkpoint(
            on_event,
            Figure::Cross,
            "skip version bump on first release".to_string(),
        );
        current.clone()
    } else {
        // Existing tags only matter for prerelease uniqueness.
        let existing_tags = if config.prerelease.is_active() {
            git::semver_tags(&config.tag_prefix).unwrap_or_default()
        } else {
            Vec::new()
        };
        let version = resolve::resolve(
            &ResolveRequest {
                current,
                release_as,
                prerelease: &config.prerelease,
                first_release: false,
                existing_tags: &existing_tags,
            },
            || conventional::recommended_bump(root, config.commands.bump_command(), current),
        )?;
        update_files(config, root, &version, &mut updated, on_event);
        version
    };

    run_script(config, root, Hook::Postbump, on_event)?;
    Ok(BumpOutcome {
        new_version,
        updated,
    })
}

/// Rewrite the version string in every bump target.
///
/// Targets that are gitignored, missing, or unreadable are skipped; an
/// unresolvable updater or a failed rewrite is surfaced as a warning.
fn update_files(
    config: &Config,
    root: &Utf8Path,
    new_version: &Version,
    updated: &mut UpdatedFiles,
    on_event: &mut EventSink<'_>,
) {
    for spec in &config.bump_files {
        let binding = match resolve_updater(spec, root) {
            Ok(binding) => binding,
            Err(e) => {
                on_event(ReleaseEvent::Warning(format!(
                    "not bumping {}: {e}",
                    spec.filename()
                )));
                continue;
            }
        };
        if git::is_ignored(&binding.filename).unwrap_or(false) {
            debug!(file = %binding.filename, "not updating gitignored file");
            continue;
        }
        let path = root.join(&binding.filename);
        if !path.is_file() {
            debug!(file = %binding.filename, "not updating, not a file");
            continue;
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                on_event(ReleaseEvent::Warning(format!(
                    "not bumping {}: {e}",
                    binding.filename
                )));
                continue;
            }
        };
        let new_contents = match binding.write_version(&contents, &new_version.to_string()) {
            Ok(new_contents) => new_contents,
            Err(e) => {
                on_event(ReleaseEvent::Warning(format!(
                    "not bumping {}: {e}",
                    binding.filename
                )));
                continue;
            }
        };
        let old = binding.read_version(&contents).unwrap_or_default();
        let new = binding
            .read_version(&new_contents)
            .unwrap_or_else(|_| new_version.to_string());
        checkpoint(
            on_event,
            Figure::Tick,
            format!("bumping version in {} from {old} to {new}", binding.filename),
        );
        if let Err(e) = crate::fsio::write_file(&path, &new_contents, config.dry_run) {
            on_event(ReleaseEvent::Warning(format!(
                "not bumping {}: {e}",
                binding.filename
            )));
            continue;
        }
        updated.record(binding.filename.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::updaters::FileSpec;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    fn sink(events: &mut Vec<ReleaseEvent>) -> impl FnMut(ReleaseEvent) + '_ {
        |e| events.push(e)
    }

    #[test]
    fn package_info_reads_first_available_file() {
        let (_tmp, root) = temp_root();
        std::fs::write(
            root.join("package.json"),
            "{\n  \"version\": \"1.4.0\",\n  \"private\": true\n}\n",
        )
        .unwrap();
        let config = Config::default();
        let mut events = Vec::new();
        let info = package_info(&config, &root, &mut sink(&mut events)).unwrap();
        assert_eq!(info.version, Version::new(1, 4, 0));
        assert!(info.private);
    }

    #[test]
    fn package_info_without_fallback_errors() {
        let (_tmp, root) = temp_root();
        let config = Config {
            git_tag_fallback: false,
            ..Default::default()
        };
        let mut events = Vec::new();
        let err = package_info(&config, &root, &mut sink(&mut events)).unwrap_err();
        assert!(matches!(err, BumpError::NoVersionSource));
    }

    #[test]
    fn skip_bump_passes_version_through() {
        let (_tmp, root) = temp_root();
        let config = Config {
            skip: crate::config::Skip {
                bump: true,
                ..Default::default()
            },
            // Would fail if the scripts ran.
            scripts: crate::config::Scripts {
                prerelease: Some("exit 1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let current = Version::new(1, 2, 3);
        let mut events = Vec::new();
        let outcome = run(&config, &root, &current, &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, current);
        assert!(outcome.updated.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn first_release_skips_bump_with_cross() {
        let (_tmp, root) = temp_root();
        std::fs::write(root.join("package.json"), "{\"version\": \"0.5.0\"}").unwrap();
        let config = Config {
            first_release: true,
            ..Default::default()
        };
        let current = Version::new(0, 5, 0);
        let mut events = Vec::new();
        let outcome = run(&config, &root, &current, &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, current);
        assert!(outcome.updated.is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            ReleaseEvent::Checkpoint { figure: Figure::Cross, message }
                if message == "skip version bump on first release"
        )));
    }

    #[test]
    fn explicit_release_as_bumps_files() {
        let (_tmp, root) = temp_root();
        std::fs::write(
            root.join("package.json"),
            "{\n  \"version\": \"1.2.3\"\n}\n",
        )
        .unwrap();
        std::fs::write(root.join("VERSION.txt"), "1.2.3\n").unwrap();
        let config = Config {
            release_as: Some("minor".to_string()),
            bump_files: vec![
                FileSpec::Path("package.json".into()),
                FileSpec::Path("VERSION.txt".into()),
            ],
            ..Default::default()
        };
        let current = Version::new(1, 2, 3);
        let mut events = Vec::new();
        let outcome = run(&config, &root, &current, &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(1, 3, 0));
        assert!(outcome.updated.contains("package.json"));
        assert!(outcome.updated.contains("VERSION.txt"));
        assert_eq!(
            std::fs::read_to_string(root.join("VERSION.txt")).unwrap(),
            "1.3.0\n"
        );
        assert!(events.iter().any(|e| matches!(
            e,
            ReleaseEvent::Checkpoint { message, .. }
                if message == "bumping version in VERSION.txt from 1.2.3 to 1.3.0"
        )));
    }

    #[test]
    fn dry_run_reports_but_does_not_write() {
        let (_tmp, root) = temp_root();
        std::fs::write(root.join("VERSION.txt"), "1.2.3\n").unwrap();
        let config = Config {
            dry_run: true,
            release_as: Some("patch".to_string()),
            bump_files: vec![FileSpec::Path("VERSION.txt".into())],
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(1, 2, 3), &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(1, 2, 4));
        assert!(outcome.updated.contains("VERSION.txt"));
        assert_eq!(
            std::fs::read_to_string(root.join("VERSION.txt")).unwrap(),
            "1.2.3\n"
        );
    }

    #[test]
    fn prebump_output_overrides_release_as() {
        let (_tmp, root) = temp_root();
        let config = Config {
            release_as: Some("patch".to_string()),
            bump_files: Vec::new(),
            scripts: crate::config::Scripts {
                prebump: Some("echo \"9.1.0\"".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(1, 2, 3), &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(9, 1, 0));
    }

    #[test]
    fn prebump_non_version_output_is_ignored() {
        let (_tmp, root) = temp_root();
        let config = Config {
            release_as: Some("patch".to_string()),
            bump_files: Vec::new(),
            scripts: crate::config::Scripts {
                prebump: Some("echo not-a-version".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(1, 2, 3), &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(1, 2, 4));
    }

    #[test]
    fn missing_bump_target_is_skipped() {
        let (_tmp, root) = temp_root();
        let config = Config {
            release_as: Some("patch".to_string()),
            bump_files: vec![FileSpec::Path("VERSION.txt".into())],
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(1, 0, 0), &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(1, 0, 1));
        assert!(outcome.updated.is_empty());
    }

    #[test]
    fn unreadable_bump_target_warns_and_continues() {
        let (_tmp, root) = temp_root();
        std::fs::write(root.join("package.json"), [0xFF, 0xFE, 0x00]).unwrap();
        std::fs::write(root.join("VERSION.txt"), "1.0.0\n").unwrap();
        let config = Config {
            release_as: Some("patch".to_string()),
            bump_files: vec![
                FileSpec::Path("package.json".into()),
                FileSpec::Path("VERSION.txt".into()),
            ],
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(1, 0, 0), &mut sink(&mut events)).unwrap();
        assert!(!outcome.updated.contains("package.json"));
        assert!(outcome.updated.contains("VERSION.txt"));
        assert!(events
            .iter()
            .any(|e| matches!(e, ReleaseEvent::Warning(w) if w.contains("package.json"))));
        assert_eq!(
            std::fs::read_to_string(root.join("VERSION.txt")).unwrap(),
            "1.0.1\n"
        );
    }

    #[test]
    fn unresolvable_updater_warns_and_continues() {
        let (_tmp, root) = temp_root();
        std::fs::write(root.join("VERSION.txt"), "2.0.0\n").unwrap();
        let config = Config {
            release_as: Some("major".to_string()),
            bump_files: vec![
                FileSpec::Path("Cargo.toml".into()),
                FileSpec::Path("VERSION.txt".into()),
            ],
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = run(&config, &root, &Version::new(2, 0, 0), &mut sink(&mut events)).unwrap();
        assert_eq!(outcome.new_version, Version::new(3, 0, 0));
        assert!(outcome.updated.contains("VERSION.txt"));
        assert!(!outcome.updated.contains("Cargo.toml"));
        assert!(events
            .iter()
            .any(|e| matches!(e, ReleaseEvent::Warning(w) if w.contains("Cargo.toml"))));
    }
}
