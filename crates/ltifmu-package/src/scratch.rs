//! Private per-build scratch directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PackageError, Result};

/// A build's working tree next to its destination, removed on drop.
///
/// The path is derived from the identifier, so a second build of the same
/// unit into the same directory fails while the first one is still running
/// (or crashed without cleaning up) instead of sharing its files.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Scratch path used for `identifier` inside `dest_dir`.
    pub fn path_for(dest_dir: &Path, identifier: &str) -> PathBuf {
        dest_dir.join(format!(".{identifier}.fmu-build"))
    }

    /// Create the scratch directory; it must not exist yet.
    pub fn create(dest_dir: &Path, identifier: &str) -> Result<Self> {
        let path = Self::path_for(dest_dir, identifier);
        match fs::create_dir(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "created scratch directory");
                Ok(Self { path })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(PackageError::ScratchExists { path })
            }
            Err(e) => Err(PackageError::Io {
                context: format!("creating scratch directory {}", path.display()),
                source: e,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_on_drop() {
        let dest = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchDir::create(dest.path(), "q").unwrap();
            fs::create_dir_all(scratch.join("a/b")).unwrap();
            fs::write(scratch.join("a/b/c.txt"), "x").unwrap();
            scratch.path().to_path_buf()
        };
        assert_eq!(path, dest.path().join(".q.fmu-build"));
        assert!(!path.exists());
    }

    #[test]
    fn refuses_existing_directory() {
        let dest = tempfile::tempdir().unwrap();
        let _first = ScratchDir::create(dest.path(), "q").unwrap();
        let err = ScratchDir::create(dest.path(), "q").unwrap_err();
        assert!(matches!(err, PackageError::ScratchExists { .. }));
        // The failed attempt must not remove the live directory.
        assert!(ScratchDir::path_for(dest.path(), "q").is_dir());
    }

    #[test]
    fn missing_parent_is_io_error() {
        let dest = tempfile::tempdir().unwrap();
        let err = ScratchDir::create(&dest.path().join("missing"), "q").unwrap_err();
        assert!(matches!(err, PackageError::Io { .. }));
    }
}
