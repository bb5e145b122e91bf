//! Updater for files whose whole content is the version.

use super::{UpdaterError, UpdaterResult, VersionUpdater};

/// Updater for `VERSION.txt`-style files.
pub struct PlainTextUpdater;

impl VersionUpdater for PlainTextUpdater {
    fn read_version(&self, contents: &str) -> UpdaterResult<String> {
        let version = contents.trim();
        if version.is_empty() {
            return Err(UpdaterError::MissingVersion("file is empty".into()));
        }
        Ok(version.to_string())
    }

    fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String> {
        // Keep whatever line ending the file already had.
        let newline = if contents.ends_with("\r\n") {
            "\r\n"
        } else if contents.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        Ok(format!("{version}{newline}"))
    }
}
