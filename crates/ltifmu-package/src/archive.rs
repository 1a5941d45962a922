//! Zip assembly of a unit tree.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PackageError, Result};

/// Zip every file under `root` into `archive`, returning the entry names.
///
/// Entry names are relative to `root`, use `/` separators and are written in
/// sorted order. Directories get no entries of their own.
pub fn write_archive(root: &Path, archive: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    let mut entries: Vec<(String, PathBuf)> = files
        .into_iter()
        .map(|path| entry_name(root, &path).map(|name| (name, path)))
        .collect::<Result<_>>()?;
    entries.sort();

    let out = File::create(archive)
        .map_err(PackageError::io(format!("creating {}", archive.display())))?;
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, path) in &entries {
        tracing::debug!(entry = %name, "adding archive entry");
        zip.start_file(name.as_str(), options)?;
        let mut input =
            File::open(path).map_err(PackageError::io(format!("reading {}", path.display())))?;
        io::copy(&mut input, &mut zip)
            .map_err(PackageError::io(format!("archiving {}", path.display())))?;
    }
    zip.finish()?;

    Ok(entries.into_iter().map(|(name, _)| name).collect())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).map_err(PackageError::io(format!("reading {}", dir.display())))?;
    for entry in entries {
        let path = entry
            .map_err(PackageError::io(format!("reading {}", dir.display())))?
            .path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| PackageError::Io {
        context: format!("{} is outside {}", path.display(), root.display()),
        source: io::Error::from(io::ErrorKind::InvalidInput),
    })?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
