use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Replace `path` with `contents` so readers never observe a half-written file.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over the destination.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    tracing::trace!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}
