//! Configuration loading and discovery.
//!
//! Configuration comes from several layers, later ones winning:
//! 1. Built-in defaults
//! 2. User config from the XDG config directory
//! 3. A legacy `.versionrc` file in the project root
//! 4. `.tagver.<ext>` / `tagver.<ext>` found by walking up from the
//!    working directory (stopping at a `.git` boundary)
//! 5. Explicit files passed on the command line
//!
//! CLI flags are applied on top of the merged result by the binary.
//!
//! # Supported formats
//!
//! TOML (`.toml`), YAML (`.yaml`, `.yml`), and JSON (`.json`). A bare
//! `.versionrc` is read as JSON. Field names accept both snake_case
//! and the camelCase spellings legacy rc files use.

use camino::{Utf8Path, Utf8PathBuf};
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use figment::value::{Dict, Map};
use figment::{Figment, Metadata, Profile, Provider};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::hooks::Hook;
use crate::updaters::FileSpec;
use crate::version::Prerelease;

/// Default changelog header, written above the release sections.
pub const DEFAULT_HEADER: &str = "# Changelog\n\nAll notable changes to this project will be documented in this file.\n";

/// Default release commit message format. `{{currentTag}}` is replaced
/// with the new version.
pub const DEFAULT_COMMIT_MESSAGE_FORMAT: &str = "chore(release): {{currentTag}}";

/// Default recommended-bump engine command.
pub const DEFAULT_BUMP_COMMAND: &str = "git-cliff --bumped-version";

/// Default changelog-section engine command. `{{tag}}` is replaced with
/// the new tag before the command runs.
pub const DEFAULT_CHANGELOG_COMMAND: &str = "git-cliff --unreleased --strip all --tag {{tag}}";

/// The configuration for a release run.
///
/// Deserialized from config files found during discovery (TOML, YAML,
/// or JSON). Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,

    /// Changelog file to read and rewrite.
    pub infile: Utf8PathBuf,
    /// Text kept above the release sections in the changelog.
    pub header: String,
    /// Use the current version as the release version, with no bump.
    pub first_release: bool,
    /// GPG-sign the release commit and tag.
    pub sign: bool,
    /// Skip git commit hooks via `--no-verify`.
    pub no_verify: bool,
    /// Add a Signed-off-by trailer to the release commit.
    pub signoff: bool,
    /// Commit all tracked changes, not just the files this run touched.
    pub commit_all: bool,
    /// Suppress all terminal output.
    pub silent: bool,
    /// Prefix for release tags.
    pub tag_prefix: String,
    /// Replace an existing tag of the same name.
    pub tag_force: bool,
    /// Explicit release override: `major`, `minor`, `patch`, or a version.
    pub release_as: Option<String>,
    /// Prerelease setting: absent, bare flag, or a named identifier.
    pub prerelease: Prerelease,
    /// How many release sections the changelog engine regenerates.
    /// Zero means rebuild the whole changelog.
    pub release_count: u32,
    /// Fall back to the highest semver tag when no package file holds
    /// a version.
    pub git_tag_fallback: bool,
    /// Override the publish hint printed after tagging.
    pub npm_publish_hint: Option<String>,
    /// Format of the release commit message.
    pub release_commit_message_format: String,
    /// Files consulted for the current version, first readable wins.
    pub package_files: Vec<FileSpec>,
    /// Files rewritten with the new version.
    pub bump_files: Vec<FileSpec>,
    /// Phases to skip.
    pub skip: Skip,
    /// Lifecycle scripts per hook.
    pub scripts: Scripts,
    /// External engine command overrides.
    pub commands: Commands,
    /// Resolve and report everything, write nothing.
    pub dry_run: bool,

    /// Deprecated: use `release_commit_message_format`. `%s` stands
    /// for the new version.
    pub message: Option<String>,
    /// Deprecated: use `header`.
    pub changelog_header: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            infile: "CHANGELOG.md".into(),
            header: DEFAULT_HEADER.to_string(),
            first_release: false,
            sign: false,
            no_verify: false,
            signoff: false,
            commit_all: false,
            silent: false,
            tag_prefix: "v".to_string(),
            tag_force: false,
            release_as: None,
            prerelease: Prerelease::Off,
            release_count: 1,
            git_tag_fallback: true,
            npm_publish_hint: None,
            release_commit_message_format: DEFAULT_COMMIT_MESSAGE_FORMAT.to_string(),
            package_files: vec![
                FileSpec::Path("package.json".into()),
                FileSpec::Path("bower.json".into()),
                FileSpec::Path("manifest.json".into()),
            ],
            bump_files: vec![
                FileSpec::Path("package.json".into()),
                FileSpec::Path("bower.json".into()),
                FileSpec::Path("manifest.json".into()),
                FileSpec::Path("package-lock.json".into()),
                FileSpec::Path("npm-shrinkwrap.json".into()),
            ],
            skip: Skip::default(),
            scripts: Scripts::default(),
            commands: Commands::default(),
            dry_run: false,
            message: None,
            changelog_header: None,
        }
    }
}

impl Config {
    /// Fold deprecated keys into their modern counterparts.
    ///
    /// Returns the warnings to surface, one per deprecated key seen. A
    /// deprecated key only takes effect when the modern key was left at
    /// its default, so explicit modern settings always win.
    pub fn modernize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(message) = self.message.take() {
            warnings.push(
                "\"message\" is deprecated, use \"release_commit_message_format\"".to_string(),
            );
            if self.release_commit_message_format == DEFAULT_COMMIT_MESSAGE_FORMAT {
                self.release_commit_message_format = message.replace("%s", "{{currentTag}}");
            }
        }
        if let Some(header) = self.changelog_header.take() {
            warnings.push("\"changelogHeader\" is deprecated, use \"header\"".to_string());
            if self.header == DEFAULT_HEADER {
                self.header = header;
            }
        }
        warnings
    }
}

/// Phases that can be skipped. Skipping a phase also skips its
/// lifecycle scripts.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Skip {
    /// Skip the version bump (keep the current version).
    pub bump: bool,
    /// Skip changelog regeneration.
    pub changelog: bool,
    /// Skip the release commit.
    pub commit: bool,
    /// Skip the release tag.
    pub tag: bool,
}

/// Lifecycle scripts, one shell command per hook.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Scripts {
    /// Runs before anything else in the bump phase.
    pub prerelease: Option<String>,
    /// Runs before the version is computed; stdout overrides release-as.
    pub prebump: Option<String>,
    /// Runs after version strings are rewritten.
    pub postbump: Option<String>,
    /// Runs before the changelog is regenerated.
    pub prechangelog: Option<String>,
    /// Runs after the changelog is written.
    pub postchangelog: Option<String>,
    /// Runs before the release commit; stdout overrides the message format.
    pub precommit: Option<String>,
    /// Runs after the release commit.
    pub postcommit: Option<String>,
    /// Runs before the release tag.
    pub pretag: Option<String>,
    /// Runs after the release tag.
    pub posttag: Option<String>,
}

impl Scripts {
    /// The command configured for a hook, if any.
    pub fn get(&self, hook: Hook) -> Option<&str> {
        match hook {
            Hook::Prerelease => self.prerelease.as_deref(),
            Hook::Prebump => self.prebump.as_deref(),
            Hook::Postbump => self.postbump.as_deref(),
            Hook::Prechangelog => self.prechangelog.as_deref(),
            Hook::Postchangelog => self.postchangelog.as_deref(),
            Hook::Precommit => self.precommit.as_deref(),
            Hook::Postcommit => self.postcommit.as_deref(),
            Hook::Pretag => self.pretag.as_deref(),
            Hook::Posttag => self.posttag.as_deref(),
        }
    }
}

/// External engine command overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Commands {
    /// Override the recommended-bump engine command.
    pub bump: Option<String>,
    /// Override the changelog-section engine command.
    pub changelog: Option<String>,
}

impl Commands {
    /// The bump engine command, defaulted.
    pub fn bump_command(&self) -> &str {
        self.bump.as_deref().unwrap_or(DEFAULT_BUMP_COMMAND)
    }

    /// The changelog engine command, defaulted.
    pub fn changelog_command(&self) -> &str {
        self.changelog.as_deref().unwrap_or(DEFAULT_CHANGELOG_COMMAND)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Legacy rc file names checked in the project root, first found wins.
const LEGACY_FILES: &[&str] = &[
    ".versionrc",
    ".versionrc.json",
    ".versionrc.yaml",
    ".versionrc.yml",
    ".versionrc.toml",
];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "tagver";

/// camelCase spellings legacy rc files use, mapped to canonical keys.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("firstRelease", "first_release"),
    ("noVerify", "no_verify"),
    ("commitAll", "commit_all"),
    ("tagPrefix", "tag_prefix"),
    ("tagForce", "tag_force"),
    ("releaseAs", "release_as"),
    ("releaseCount", "release_count"),
    ("gitTagFallback", "git_tag_fallback"),
    ("npmPublishHint", "npm_publish_hint"),
    ("releaseCommitMessageFormat", "release_commit_message_format"),
    ("packageFiles", "package_files"),
    ("bumpFiles", "bump_files"),
    ("dryRun", "dry_run"),
    ("logLevel", "log_level"),
    ("logDir", "log_dir"),
    ("changelogHeader", "changelog_header"),
];

/// Renames legacy camelCase keys to their canonical snake_case names
/// before a file layer is merged.
///
/// The merged dictionary must carry one spelling per field: the
/// serialized defaults already use the canonical names, and serde
/// rejects a dictionary holding both spellings as a duplicate field.
/// An explicit canonical key in the same file wins over its legacy
/// spelling.
struct CanonicalKeys<P>(P);

impl<P: Provider> Provider for CanonicalKeys<P> {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let mut data = self.0.data()?;
        for dict in data.values_mut() {
            canonicalize_keys(dict);
        }
        Ok(data)
    }
}

fn canonicalize_keys(dict: &mut Dict) {
    for (legacy, canonical) in LEGACY_KEYS {
        if let Some(value) = dict.remove(*legacy) {
            dict.entry((*canonical).to_string()).or_insert(value);
        }
    }
}

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for the CLI flag or tests).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/tagver/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. Legacy `.versionrc` in the search root
    /// 4. User config (`~/.config/tagver/config.<ext>`)
    /// 5. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Start with user config (lowest precedence of file sources)
        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root {
            if let Some(legacy) = Self::find_legacy_config(root) {
                figment = Self::merge_file(figment, &legacy);
            }
            if let Some(project_config) = self.find_project_config(root) {
                figment = Self::merge_file(figment, &project_config);
            }
        }

        // Add explicit files (highest precedence)
        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            // Check for config files in this directory (try each extension)
            for ext in CONFIG_EXTENSIONS {
                // Try dotfile first (.tagver.toml)
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                // Then try regular name (tagver.toml)
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The repository root is the last directory searched.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find a legacy rc file in the given directory (no walk-up).
    fn find_legacy_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
        LEGACY_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
        let config_dir = proj_dirs.config_dir();

        // Try each supported extension
        for ext in CONFIG_EXTENSIONS {
            let config_path = config_dir.join(format!("config.{ext}"));
            if config_path.is_file() {
                return Utf8PathBuf::from_path_buf(config_path).ok();
            }
        }

        None
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("toml") => figment.merge(CanonicalKeys(Toml::file_exact(path.as_str()))),
            Some("yaml" | "yml") => figment.merge(CanonicalKeys(Yaml::file_exact(path.as_str()))),
            // A bare .versionrc is JSON
            Some("json") | None => figment.merge(CanonicalKeys(Json::file_exact(path.as_str()))),
            _ => figment.merge(CanonicalKeys(Json::file_exact(path.as_str()))),
        }
    }
}
