//! Custom updater executables.
//!
//! A custom updater is any executable speaking a two-verb protocol:
//! `<updater> read` receives the file contents on stdin and prints the
//! version on stdout; `<updater> write <version>` receives the contents
//! on stdin and prints the rewritten contents on stdout.

use std::io::Write;
use std::process::{Command, Stdio};

use camino::Utf8PathBuf;

use super::{UpdaterError, UpdaterResult, VersionUpdater};

/// Updater backed by an external executable.
pub struct CommandUpdater {
    program: Utf8PathBuf,
}

impl CommandUpdater {
    /// Bind to an executable, verifying it exists.
    pub fn load(program: Utf8PathBuf) -> UpdaterResult<Self> {
        if !program.is_file() {
            return Err(UpdaterError::UpdaterNotFound(program));
        }
        Ok(Self { program })
    }

    fn invoke(&self, args: &[&str], stdin: &str) -> UpdaterResult<String> {
        let mut child = Command::new(self.program.as_std_path())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| UpdaterError::UpdaterFailed {
                program: self.program.clone(),
                message: format!("failed to spawn: {e}"),
            })?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin.as_bytes())?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(UpdaterError::UpdaterFailed {
                program: self.program.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|e| UpdaterError::Parse(e.to_string()))
    }
}

impl VersionUpdater for CommandUpdater {
    fn read_version(&self, contents: &str) -> UpdaterResult<String> {
        Ok(self.invoke(&["read"], contents)?.trim().to_string())
    }

    fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String> {
        self.invoke(&["write", version], contents)
    }
}
