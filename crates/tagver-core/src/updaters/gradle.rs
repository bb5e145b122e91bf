//! Updater for Gradle build scripts.

use std::sync::LazyLock;

use regex::Regex;

use super::{UpdaterError, UpdaterResult, VersionUpdater};

// Matches `version = '1.2.3'` or `version = "1.2.3"` at line start.
static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version\s+=\s+(['"])([\d.]+)['"]"#).expect("valid regex")
});

/// Updater for `build.gradle` files.
pub struct GradleUpdater;

impl VersionUpdater for GradleUpdater {
    fn read_version(&self, contents: &str) -> UpdaterResult<String> {
        VERSION_LINE
            .captures(contents)
            .map(|c| c[2].to_string())
            .ok_or_else(|| UpdaterError::MissingVersion("no version = '...' line".into()))
    }

    fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String> {
        let caps = VERSION_LINE
            .captures(contents)
            .ok_or_else(|| UpdaterError::MissingVersion("no version = '...' line".into()))?;
        // Splice the new version between the original quotes.
        let span = caps.get(2).expect("capture group");
        let mut out = String::with_capacity(contents.len());
        out.push_str(&contents[..span.start()]);
        out.push_str(version);
        out.push_str(&contents[span.end()..]);
        Ok(out)
    }
}
