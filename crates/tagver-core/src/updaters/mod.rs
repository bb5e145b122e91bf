//! Version-string updaters.
//!
//! Each file listed in `package-files` or `bump-files` is paired with
//! an updater that knows how to read and rewrite the version string in
//! that file format. Well-known filenames resolve automatically; other
//! files need an explicit `type` or a custom `updater` executable.

mod command;
mod gradle;
mod json;
mod plain_text;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::CommandUpdater;
pub use gradle::GradleUpdater;
pub use json::JsonUpdater;
pub use plain_text::PlainTextUpdater;

/// Errors from updater resolution and content rewriting.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The file parsed but carries no version field.
    #[error("no version found: {0}")]
    MissingVersion(String),

    /// The file content could not be parsed at all.
    #[error("malformed content: {0}")]
    Parse(String),

    /// No built-in updater matches the filename.
    #[error("unsupported file \"{0}\": specify an updater type or a custom updater")]
    Unsupported(Utf8PathBuf),

    /// A custom updater executable is missing.
    #[error("custom updater not found: {0}")]
    UpdaterNotFound(Utf8PathBuf),

    /// A custom updater executable failed.
    #[error("custom updater {program} failed: {message}")]
    UpdaterFailed {
        /// Path to the executable.
        program: Utf8PathBuf,
        /// Error details.
        message: String,
    },

    /// An I/O error while talking to a custom updater.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for updater operations.
pub type UpdaterResult<T> = Result<T, UpdaterError>;

/// Rewrites the version string inside one file format.
///
/// Implementations must round-trip: writing back the version that was
/// just read reproduces the input byte for byte.
pub trait VersionUpdater {
    /// Extract the version string from file contents.
    fn read_version(&self, contents: &str) -> UpdaterResult<String>;

    /// Return the contents with the version replaced.
    fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String>;

    /// Whether the file marks the package private (skips publish hints).
    fn is_private(&self, _contents: &str) -> bool {
        false
    }
}

/// Built-in updater kinds, selectable via `type` in a file spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdaterKind {
    /// JSON package files with a top-level `version` field.
    Json,
    /// Files whose entire content is the version.
    PlainText,
    /// Gradle build scripts with a `version = "..."` line.
    Gradle,
}

/// One entry of `package-files` or `bump-files`.
///
/// In config this is either a bare path string or a table with a
/// `filename` plus a `type` or custom `updater`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    /// Explicit built-in updater kind.
    Typed {
        /// Path to the file, relative to the project root.
        filename: Utf8PathBuf,
        /// Which built-in updater to use.
        #[serde(rename = "type")]
        kind: UpdaterKind,
    },
    /// Custom updater executable.
    Custom {
        /// Path to the file, relative to the project root.
        filename: Utf8PathBuf,
        /// Path to the updater executable.
        updater: Utf8PathBuf,
    },
    /// Bare path, resolved by filename convention.
    Path(Utf8PathBuf),
}

impl FileSpec {
    /// The file this spec points at.
    pub fn filename(&self) -> &Utf8Path {
        match self {
            Self::Typed { filename, .. } | Self::Custom { filename, .. } | Self::Path(filename) => {
                filename
            }
        }
    }
}

/// A file paired with its resolved updater.
pub struct UpdaterBinding {
    /// Path to the file, relative to the project root.
    pub filename: Utf8PathBuf,
    updater: Box<dyn VersionUpdater>,
}

impl UpdaterBinding {
    /// See [`VersionUpdater::read_version`].
    pub fn read_version(&self, contents: &str) -> UpdaterResult<String> {
        self.updater.read_version(contents)
    }

    /// See [`VersionUpdater::write_version`].
    pub fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String> {
        self.updater.write_version(contents, version)
    }

    /// See [`VersionUpdater::is_private`].
    pub fn is_private(&self, contents: &str) -> bool {
        self.updater.is_private(contents)
    }
}

impl std::fmt::Debug for UpdaterBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdaterBinding")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// JSON package files recognized by filename.
const JSON_FILES: &[&str] = &[
    "package.json",
    "bower.json",
    "manifest.json",
    "package-lock.json",
    "npm-shrinkwrap.json",
];

/// Plain-text version files recognized by filename.
const PLAIN_TEXT_FILES: &[&str] = &["VERSION.txt", "version.txt"];

/// Resolve a file spec to a concrete updater.
pub fn resolve_updater(spec: &FileSpec, root: &Utf8Path) -> UpdaterResult<UpdaterBinding> {
    match spec {
        FileSpec::Typed { filename, kind } => Ok(UpdaterBinding {
            filename: filename.clone(),
            updater: builtin(*kind),
        }),
        FileSpec::Custom { filename, updater } => Ok(UpdaterBinding {
            filename: filename.clone(),
            updater: Box::new(CommandUpdater::load(root.join(updater))?),
        }),
        FileSpec::Path(filename) => {
            let kind =
                kind_for_filename(filename).ok_or_else(|| UpdaterError::Unsupported(filename.clone()))?;
            Ok(UpdaterBinding {
                filename: filename.clone(),
                updater: builtin(kind),
            })
        }
    }
}

fn builtin(kind: UpdaterKind) -> Box<dyn VersionUpdater> {
    match kind {
        UpdaterKind::Json => Box::new(JsonUpdater),
        UpdaterKind::PlainText => Box::new(PlainTextUpdater),
        UpdaterKind::Gradle => Box::new(GradleUpdater),
    }
}

fn kind_for_filename(path: &Utf8Path) -> Option<UpdaterKind> {
    let name = path.file_name()?;
    if JSON_FILES.contains(&name) {
        Some(UpdaterKind::Json)
    } else if PLAIN_TEXT_FILES.contains(&name) {
        Some(UpdaterKind::PlainText)
    } else if name == "build.gradle" || name == "build.gradle.kts" {
        Some(UpdaterKind::Gradle)
    } else {
        None
    }
}
