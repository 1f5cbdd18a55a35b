//! Filesystem helpers for backups.

use std::fs;
use std::io;
use std::path::Path;

/// Move a finished temp file into place, replacing any existing destination.
///
/// Some platforms refuse to rename onto an existing file, so the destination
/// is removed and the rename retried once. The temp file is removed if the
/// retry also fails.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Rename into {} failed (initial: {}, retry: {})",
                    destination.display(),
                    initial_err,
                    retry_err
                ),
            )
        })?;
    }
    Ok(())
}
