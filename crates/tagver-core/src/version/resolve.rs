//! Next-version resolution.
//!
//! Given the current version, the prerelease setting, and an optional
//! `release-as` override, compute the version the release will carry.
//! The increment rules follow the semver tooling convention: a bump on
//! top of an in-flight prerelease that already covers the requested
//! level only drops the prerelease suffix, a `prerelease` increment on
//! a final version bumps patch first, and switching identifiers resets
//! the suffix counter to zero.
//!
//! Prerelease candidates are additionally checked against the tags
//! that already exist so that re-running a prerelease after the
//! previous one was tagged never produces a duplicate.

use semver::{BuildMetadata, Version};

use super::{Prerelease, ReleaseAs, ReleaseType, VersionError, VersionResult};

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// Inputs to [`resolve`].
#[derive(Debug)]
pub struct ResolveRequest<'a> {
    /// The version the project is currently at.
    pub current: &'a Version,
    /// Explicit override, already parsed; `None` means ask the engine.
    pub release_as: Option<ReleaseAs>,
    /// Prerelease setting.
    pub prerelease: &'a Prerelease,
    /// First release: keep the current version as-is.
    pub first_release: bool,
    /// Versions of every existing release tag, prefix already stripped.
    pub existing_tags: &'a [Version],
}

/// Resolve the next version.
///
/// `recommend` is only invoked when no `release-as` override is present
/// and this is not the first release.
pub fn resolve(
    req: &ResolveRequest<'_>,
    recommend: impl FnOnce() -> VersionResult<ReleaseType>,
) -> VersionResult<Version> {
    if req.first_release {
        return Ok(req.current.clone());
    }
    match &req.release_as {
        Some(ReleaseAs::Exact(v)) => resolve_exact(v, req.prerelease, req.existing_tags),
        Some(ReleaseAs::Type(level)) => {
            resolve_bump(req.current, *level, req.prerelease, req.existing_tags)
        }
        None => {
            let level = recommend()?;
            resolve_bump(req.current, level, req.prerelease, req.existing_tags)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exact overrides
// ─────────────────────────────────────────────────────────────────────────────

fn resolve_exact(
    exact: &Version,
    prerelease: &Prerelease,
    tags: &[Version],
) -> VersionResult<Version> {
    if !prerelease.is_active() {
        return Ok(exact.clone());
    }
    let identifier = prerelease.identifier();
    let pre = if exact.pre.is_empty() {
        new_pre(identifier)?
    } else {
        // An override like 2.0.0-rc.3 only cooperates with a matching
        // prerelease identifier, and is then kept as-is.
        let parts: Vec<&str> = exact.pre.split('.').collect();
        let own = parts[..parts.len() - 1].join(".");
        if own != identifier.unwrap_or("") {
            return Err(VersionError::PrereleaseConflict {
                release_as: exact.to_string(),
                identifier: identifier.unwrap_or("").to_string(),
            });
        }
        exact.pre.clone()
    };
    let mut candidate = Version {
        major: exact.major,
        minor: exact.minor,
        patch: exact.patch,
        pre,
        build: exact.build.clone(),
    };
    ensure_unique(&mut candidate, identifier, tags)?;
    Ok(candidate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Bumps
// ─────────────────────────────────────────────────────────────────────────────

/// What the increment actually does once continuation is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Increment {
    /// Plain release bump.
    Release(ReleaseType),
    /// Fresh prerelease at a higher level (premajor, preminor, prepatch).
    PreRelease(ReleaseType),
    /// Continue the prerelease already in flight.
    Continuation,
}

fn resolve_bump(
    current: &Version,
    expected: ReleaseType,
    prerelease: &Prerelease,
    tags: &[Version],
) -> VersionResult<Version> {
    let increment = if prerelease.is_active() {
        match active_type(current) {
            // Continue when the in-flight prerelease already covers the
            // expected level (same level, or a more significant one).
            Some(active) if !current.pre.is_empty() && active >= expected => {
                Increment::Continuation
            }
            _ => Increment::PreRelease(expected),
        }
    } else {
        Increment::Release(expected)
    };

    let identifier = prerelease.identifier();
    let mut candidate = apply_increment(current, increment, identifier)?;
    if prerelease.is_active() {
        ensure_unique(&mut candidate, identifier, tags)?;
    }
    Ok(candidate)
}

/// The most significant non-zero component of a version, or `None` for
/// an all-zero one. `1.1.0` is a minor, `2.0.0` a major, `1.0.1` a patch.
fn active_type(v: &Version) -> Option<ReleaseType> {
    if v.patch != 0 {
        Some(ReleaseType::Patch)
    } else if v.minor != 0 {
        Some(ReleaseType::Minor)
    } else if v.major != 0 {
        Some(ReleaseType::Major)
    } else {
        None
    }
}

fn apply_increment(
    current: &Version,
    increment: Increment,
    identifier: Option<&str>,
) -> VersionResult<Version> {
    let mut v = current.clone();
    v.build = BuildMetadata::EMPTY;
    match increment {
        Increment::Release(ReleaseType::Major) => {
            // 1.0.0-rc.1 → 1.0.0, but 1.1.0-rc.1 → 2.0.0.
            if v.minor != 0 || v.patch != 0 || v.pre.is_empty() {
                v.major += 1;
            }
            v.minor = 0;
            v.patch = 0;
            v.pre = semver::Prerelease::EMPTY;
        }
        Increment::Release(ReleaseType::Minor) => {
            if v.patch != 0 || v.pre.is_empty() {
                v.minor += 1;
            }
            v.patch = 0;
            v.pre = semver::Prerelease::EMPTY;
        }
        Increment::Release(ReleaseType::Patch) => {
            if v.pre.is_empty() {
                v.patch += 1;
            }
            v.pre = semver::Prerelease::EMPTY;
        }
        Increment::PreRelease(level) => {
            match level {
                ReleaseType::Major => {
                    v.major += 1;
                    v.minor = 0;
                    v.patch = 0;
                }
                ReleaseType::Minor => {
                    v.minor += 1;
                    v.patch = 0;
                }
                ReleaseType::Patch => {
                    v.patch += 1;
                }
            }
            v.pre = new_pre(identifier)?;
        }
        Increment::Continuation => {
            if v.pre.is_empty() {
                v.patch += 1;
            }
            v.pre = continued_pre(&v.pre, identifier)?;
        }
    }
    Ok(v)
}

/// A fresh prerelease suffix: `<id>.0`, or bare `0`.
fn new_pre(identifier: Option<&str>) -> VersionResult<semver::Prerelease> {
    let s = match identifier {
        Some(id) => format!("{id}.0"),
        None => "0".to_string(),
    };
    Ok(semver::Prerelease::new(&s)?)
}

/// Continue an existing prerelease suffix: bump the trailing numeric
/// part, or append `.0` if there is none. A differing identifier resets
/// to `<id>.0`.
fn continued_pre(
    pre: &semver::Prerelease,
    identifier: Option<&str>,
) -> VersionResult<semver::Prerelease> {
    let mut parts: Vec<String> = if pre.is_empty() {
        vec!["0".to_string()]
    } else {
        let mut parts: Vec<String> = pre.split('.').map(str::to_string).collect();
        let mut bumped = false;
        for part in parts.iter_mut().rev() {
            if let Ok(n) = part.parse::<u64>() {
                *part = (n + 1).to_string();
                bumped = true;
                break;
            }
        }
        if !bumped {
            parts.push("0".to_string());
        }
        parts
    };
    if let Some(id) = identifier {
        let matches_id = parts.first().is_some_and(|p| p == id)
            && parts.get(1).is_some_and(|p| p.parse::<u64>().is_ok());
        if !matches_id {
            parts = vec![id.to_string(), "0".to_string()];
        }
    }
    Ok(semver::Prerelease::new(&parts.join("."))?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Uniqueness against existing tags
// ─────────────────────────────────────────────────────────────────────────────

/// Bump the candidate's prerelease number past any colliding tag.
///
/// A tag collides when it shares major.minor.patch and the same
/// prerelease channel: the same identifier for named channels, or a
/// numeric-only suffix for unnamed ones.
fn ensure_unique(
    candidate: &mut Version,
    identifier: Option<&str>,
    tags: &[Version],
) -> VersionResult<()> {
    let max_taken = tags
        .iter()
        .filter(|t| {
            t.major == candidate.major
                && t.minor == candidate.minor
                && t.patch == candidate.patch
                && !t.pre.is_empty()
                && same_channel(&t.pre, identifier)
        })
        .filter_map(|t| numeric_suffix(&t.pre))
        .max();

    if let Some(taken) = max_taken {
        let own = numeric_suffix(&candidate.pre).unwrap_or(0);
        if own <= taken {
            candidate.pre = with_suffix(identifier, taken + 1)?;
        }
    }
    Ok(())
}

fn same_channel(pre: &semver::Prerelease, identifier: Option<&str>) -> bool {
    match identifier {
        Some(id) => pre.split('.').next() == Some(id),
        None => pre.split('.').all(|p| p.parse::<u64>().is_ok()),
    }
}

/// The trailing numeric part of a prerelease suffix, if any.
fn numeric_suffix(pre: &semver::Prerelease) -> Option<u64> {
    pre.split('.').next_back()?.parse::<u64>().ok()
}

fn with_suffix(identifier: Option<&str>, n: u64) -> VersionResult<semver::Prerelease> {
    let s = match identifier {
        Some(id) => format!("{id}.{n}"),
        None => n.to_string(),
    };
    Ok(semver::Prerelease::new(&s)?)
}
