//! File write helper shared by the bump and changelog phases.

use std::io::Write;

use camino::Utf8Path;
use tracing::debug;

/// Write file contents atomically: stage in a temp file next to the
/// target, then rename over it. A dry run logs and writes nothing.
pub fn write_file(path: &Utf8Path, contents: &str, dry_run: bool) -> std::io::Result<()> {
    if dry_run {
        debug!(%path, "dry run, skipping write");
        return Ok(());
    }
    let dir = path.parent().unwrap_or(Utf8Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path)?;
    debug!(%path, bytes = contents.len(), "wrote file");
    Ok(())
}
