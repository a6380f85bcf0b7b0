//! Atomic file replacement.
//!
//! New content is written to a temporary file in the target's directory and
//! renamed over the original. Readers observe either the old bytes or the new
//! bytes, never a truncated file.

use crate::error::{RewriteError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// New content staged next to its target, not yet visible.
///
/// Dropping a staged write discards the temporary file and leaves the target
/// untouched.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Returns the temporary file's path.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Renames the temporary file over the target.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| RewriteError::io_at(&target, e.error))?;
        Ok(())
    }
}

/// Writes `contents` to a temporary file beside `path`.
///
/// The temporary file receives the target's permissions when the target exists.
pub fn stage(path: &Path, contents: &str) -> Result<StagedWrite> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".rewrite-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| RewriteError::io_at(dir, e))?;

    temp.write_all(contents.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| RewriteError::io_at(temp.path(), e))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| RewriteError::io_at(temp.path(), e))?;
    }

    Ok(StagedWrite {
        target: path.to_path_buf(),
        temp,
    })
}

/// Atomically replaces the contents of `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    stage(path, contents)?.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.js");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_staged_write_is_invisible_until_commit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.js");
        fs::write(&path, "old").unwrap();

        let staged = stage(&path, "new").unwrap();
        assert_eq!(staged.temp_path().parent(), Some(dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_to_string(staged.temp_path()).unwrap(), "new");

        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_abandoned_stage_leaves_original_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.js");
        fs::write(&path, "original content\n").unwrap();

        let staged = stage(&path, "half-writ").unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        drop(staged);

        assert_eq!(fs::read_to_string(&path).unwrap(), "original content\n");
        assert!(!temp_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.js");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, "new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
