//! Runtime skeleton contract.
//!
//! The skeleton is the fixed C implementation of the host-facing lifecycle
//! (`fmi2Instantiate`, `fmi2DoStep`, getters and setters, ...). It is not
//! generated: it is read from a directory and copied verbatim into
//! `sources/include/`. The generated source includes its header first and
//! its implementation last, and supplies the hooks it calls.
//!
//! ltifmu does not ship a skeleton. Builds read it from `--runtime-dir`,
//! `[runtime] dir` in `ltifmu.toml`, `LTIFMU_RUNTIME_DIR`, or `./runtime`,
//! in that order. `tests/fixtures/runtime` holds the set the integration
//! tests compile against.

use std::fs;
use std::path::{Path, PathBuf};

use ltifmu_codegen::{SKELETON_HEADER, SKELETON_IMPLEMENTATION};

use crate::error::{PackageError, Result};

/// Files the skeleton directory must provide.
pub const REQUIRED_FILES: [&str; 5] = [
    SKELETON_HEADER,
    SKELETON_IMPLEMENTATION,
    "fmi2Functions.h",
    "fmi2FunctionTypes.h",
    "fmi2TypesPlatform.h",
];

/// A validated runtime skeleton directory.
#[derive(Debug, Clone)]
pub struct RuntimeSkeleton {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl RuntimeSkeleton {
    /// Validate `dir` and list the files it contributes.
    ///
    /// Every regular file in `dir` is part of the skeleton; the ones in
    /// [`REQUIRED_FILES`] must be present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let entries = fs::read_dir(&dir).map_err(|e| PackageError::RuntimeSkeleton {
            dir: dir.clone(),
            reason: format!("cannot read directory: {e}"),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(PackageError::io("reading runtime skeleton"))?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let missing: Vec<&str> = REQUIRED_FILES
            .iter()
            .copied()
            .filter(|name| !files.iter().any(|f| f.file_name().is_some_and(|n| n == *name)))
            .collect();
        if !missing.is_empty() {
            return Err(PackageError::RuntimeSkeleton {
                dir,
                reason: format!("missing {}", missing.join(", ")),
            });
        }

        tracing::debug!(dir = %dir.display(), files = files.len(), "runtime skeleton found");
        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Skeleton files, sorted by path.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Copy every skeleton file into `include_dir`.
    pub fn install(&self, include_dir: &Path) -> Result<()> {
        fs::create_dir_all(include_dir).map_err(PackageError::io(format!(
            "creating {}",
            include_dir.display()
        )))?;
        for file in &self.files {
            let Some(name) = file.file_name() else {
                continue;
            };
            fs::copy(file, include_dir.join(name))
                .map_err(PackageError::io(format!("copying {}", file.display())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), format!("/* {name} */\n")).unwrap();
        }
    }

    #[test]
    fn open_and_install() {
        let src = tempfile::tempdir().unwrap();
        populate(src.path(), &REQUIRED_FILES);
        populate(src.path(), &["extra.h"]);
        fs::create_dir(src.path().join("nested")).unwrap();

        let skeleton = RuntimeSkeleton::open(src.path()).unwrap();
        assert_eq!(skeleton.files().len(), REQUIRED_FILES.len() + 1);

        let out = tempfile::tempdir().unwrap();
        let include = out.path().join("include");
        skeleton.install(&include).unwrap();
        assert!(include.join("fmi2Template.c").is_file());
        assert!(include.join("extra.h").is_file());
        assert!(!include.join("nested").exists());
    }

    #[test]
    fn reports_missing_files() {
        let src = tempfile::tempdir().unwrap();
        populate(src.path(), &[SKELETON_HEADER, "fmi2Functions.h"]);
        let err = RuntimeSkeleton::open(src.path()).unwrap_err();
        let reason = match err {
            PackageError::RuntimeSkeleton { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        };
        assert!(reason.contains("fmi2Template.c"));
        assert!(reason.contains("fmi2TypesPlatform.h"));
        assert!(!reason.contains("fmi2Functions.h,"));
    }

    #[test]
    fn missing_directory() {
        let err = RuntimeSkeleton::open("/nonexistent/ltifmu/runtime").unwrap_err();
        assert!(matches!(err, PackageError::RuntimeSkeleton { .. }));
    }
}
