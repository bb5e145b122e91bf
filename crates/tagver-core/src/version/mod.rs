//! Version determination and computation.
//!
//! The next version comes from one of two sources: an explicit
//! `release-as` override (a bump keyword or an exact version), or the
//! recommended-bump engine that inspects the commit history. Either way
//! the result is run through [`resolve::resolve`], which applies
//! prerelease continuation rules and keeps prerelease numbers unique
//! against the tags that already exist.

pub mod conventional;
pub mod resolve;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid semver: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// `release-as` was neither a bump keyword nor a version.
    #[error("release-as must be major, minor, patch, or a version, got \"{0}\"")]
    InvalidReleaseAs(String),

    /// An exact release-as version carries a prerelease identifier that
    /// disagrees with the configured one.
    #[error(
        "release-as \"{release_as}\" conflicts with prerelease identifier \"{identifier}\""
    )]
    PrereleaseConflict {
        /// The exact version requested.
        release_as: String,
        /// The configured prerelease identifier.
        identifier: String,
    },

    /// The recommended-bump engine failed.
    #[error("{engine} failed: {message}")]
    EngineFailed {
        /// Engine command line (e.g., "git-cliff --bumped-version").
        engine: String,
        /// Error details.
        message: String,
    },

    /// The recommended-bump engine printed something unusable.
    #[error("could not interpret bump engine output: \"{0}\"")]
    EngineOutput(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level, ordered by how much of the version it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Patch release (x.y.Z).
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl ReleaseType {
    /// Keyword form, as accepted by `release-as`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReleaseType {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(VersionError::InvalidReleaseAs(other.to_string())),
        }
    }
}

/// A parsed `release-as` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseAs {
    /// Bump by a keyword level.
    Type(ReleaseType),
    /// Release exactly this version.
    Exact(Version),
}

/// Parse a `release-as` value: a bump keyword or an exact version
/// (with or without a leading `v`).
pub fn parse_release_as(s: &str) -> VersionResult<ReleaseAs> {
    if let Ok(level) = s.parse::<ReleaseType>() {
        return Ok(ReleaseAs::Type(level));
    }
    parse_version(s)
        .map(ReleaseAs::Exact)
        .map_err(|_| VersionError::InvalidReleaseAs(s.to_string()))
}

/// Prerelease setting: off, numeric-only (`--prerelease` with no value),
/// or a named channel (`--prerelease alpha`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Prerelease {
    /// Plain releases.
    #[default]
    Off,
    /// Prerelease with numeric-only suffixes (`1.2.0-0`).
    Unnamed,
    /// Prerelease with a named identifier (`1.2.0-alpha.0`).
    Named(String),
}

impl Prerelease {
    /// Whether a prerelease was requested at all.
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Off)
    }

    /// The identifier, if this is a named channel.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Named(id) => Some(id),
            _ => None,
        }
    }
}

// Config files and flags express this as a bool or a string, so the
// serde forms are `false`/`true`/`"alpha"` rather than enum variants.
impl Serialize for Prerelease {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Off => serializer.serialize_bool(false),
            Self::Unnamed => serializer.serialize_bool(true),
            Self::Named(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for Prerelease {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Id(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Self::Off,
            Raw::Flag(true) => Self::Unnamed,
            Raw::Id(id) if id.is_empty() => Self::Unnamed,
            Raw::Id(id) => Self::Named(id),
        })
    }
}

/// Parse a version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let s = s.strip_prefix('v').unwrap_or(s);
    Ok(Version::parse(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_v_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_without_v_prefix() {
        assert_eq!(parse_version("1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_version("not-a-version").is_err());
    }

    #[test]
    fn release_as_keywords() {
        assert_eq!(
            parse_release_as("minor").unwrap(),
            ReleaseAs::Type(ReleaseType::Minor)
        );
        assert_eq!(
            parse_release_as("2.0.0").unwrap(),
            ReleaseAs::Exact(Version::new(2, 0, 0))
        );
        assert_eq!(
            parse_release_as("v1.1.0").unwrap(),
            ReleaseAs::Exact(Version::new(1, 1, 0))
        );
    }

    #[test]
    fn release_as_rejects_garbage() {
        assert!(matches!(
            parse_release_as("huge"),
            Err(VersionError::InvalidReleaseAs(_))
        ));
    }

    #[test]
    fn release_type_priority_order() {
        assert!(ReleaseType::Patch < ReleaseType::Minor);
        assert!(ReleaseType::Minor < ReleaseType::Major);
    }

    #[test]
    fn prerelease_from_bool_and_string() {
        let off: Prerelease = serde_json::from_str("false").unwrap();
        let unnamed: Prerelease = serde_json::from_str("true").unwrap();
        let empty: Prerelease = serde_json::from_str("\"\"").unwrap();
        let named: Prerelease = serde_json::from_str("\"alpha\"").unwrap();
        assert_eq!(off, Prerelease::Off);
        assert_eq!(unnamed, Prerelease::Unnamed);
        assert_eq!(empty, Prerelease::Unnamed);
        assert_eq!(named, Prerelease::Named("alpha".into()));
        assert!(!off.is_active());
        assert!(unnamed.is_active());
        assert_eq!(named.identifier(), Some("alpha"));
        assert_eq!(unnamed.identifier(), None);
    }
}
