//! Saving extracted text to disk.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `text` to `path` atomically.
///
/// The text goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a half-written file.
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
