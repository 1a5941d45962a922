//! Build pipeline orchestrator.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ltifmu_codegen::{
    is_c_identifier, render_descriptor, render_source, BuildIdentity, DESCRIPTOR_FILE_NAME,
    SOURCE_FILE_NAME,
};
use ltifmu_model::{Block, LtiModel};

use crate::archive::write_archive;
use crate::error::{PackageError, Result};
use crate::platform::PlatformId;
use crate::report::BuildReport;
use crate::scratch::ScratchDir;
use crate::skeleton::RuntimeSkeleton;
use crate::toolchain::{CompileRequest, Toolchain};

/// Euler step used when none is configured.
pub const DEFAULT_STEP_SIZE: f64 = 1e-3;

/// Configuration for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Destination archive; its stem becomes the model identifier.
    pub output: PathBuf,
    /// Directory holding the runtime skeleton.
    pub runtime_dir: PathBuf,
    /// Longest Euler substep, exported to the generated source as `STEP_SIZE`.
    pub step_size: f64,
    /// Whether `sources/` is kept in the archive.
    pub keep_sources: bool,
    /// Platform the library is built for.
    pub platform: PlatformId,
}

impl BuildConfig {
    /// Defaults for the host platform.
    pub fn new(output: impl Into<PathBuf>, runtime_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            output: output.into(),
            runtime_dir: runtime_dir.into(),
            step_size: DEFAULT_STEP_SIZE,
            keep_sources: true,
            platform: PlatformId::host()?,
        })
    }
}

/// A checked destination: the directory it lives in and the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub dir: PathBuf,
    pub identifier: String,
}

/// Check that `output` names a `.fmu` in an existing directory and that its
/// stem is a C identifier.
pub fn check_destination(output: &Path) -> Result<Destination> {
    let invalid = |reason: &str| PackageError::InvalidDestination {
        path: output.to_path_buf(),
        reason: reason.to_string(),
    };

    if output.extension().and_then(|e| e.to_str()) != Some("fmu") {
        return Err(invalid("file name must end with .fmu"));
    }
    let identifier = output
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid("file name has no stem"))?;
    if !is_c_identifier(identifier) {
        return Err(invalid(
            "file stem must be a C identifier (letters, digits and '_', not starting with a digit)",
        ));
    }

    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Err(invalid("parent directory does not exist"));
    }
    if output.is_dir() {
        return Err(invalid("a directory already exists at this path"));
    }

    Ok(Destination {
        dir,
        identifier: identifier.to_string(),
    })
}

/// Generated text of one unit.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub identity: BuildIdentity,
    pub source: String,
    pub descriptor: String,
}

/// Render source and descriptor for `model` under a fresh identity.
pub fn render(model: &LtiModel, identifier: &str, step_size: f64) -> Result<Rendered> {
    let identity = BuildIdentity::new(identifier)?;
    let layout = model.layout();
    tracing::debug!(
        x = ?layout.range(Block::State),
        u = ?layout.range(Block::Input),
        y = ?layout.range(Block::Output),
        nr = layout.register_count(),
        "register layout"
    );
    let source = render_source(model, &layout, &identity, step_size)?;
    let descriptor = render_descriptor(model, &layout, &identity)?;
    Ok(Rendered {
        identity,
        source,
        descriptor,
    })
}

/// Run the full build:
/// check destination -> render -> scratch tree -> compile -> zip -> move into place.
///
/// The scratch directory is removed on every path, and nothing is written to
/// the destination unless the whole build succeeds.
pub fn build(
    model: &LtiModel,
    config: &BuildConfig,
    toolchain: &dyn Toolchain,
) -> Result<BuildReport> {
    let start = Instant::now();

    // Stage 1: Destination and inputs
    let dest = check_destination(&config.output)?;
    let skeleton = RuntimeSkeleton::open(&config.runtime_dir)?;
    tracing::info!(
        identifier = %dest.identifier,
        nx = model.nx(),
        nu = model.nu(),
        ny = model.ny(),
        platform = %config.platform,
        "building unit"
    );
    if model.nx() > 0 {
        tracing::warn!(
            step_size = config.step_size,
            "states are integrated with fixed-step forward Euler without a stability check; \
             stiff or fast models may diverge"
        );
    }

    // Stage 2: Render
    let rendered = render(model, &dest.identifier, config.step_size)?;

    // Stage 3: Scratch tree
    let scratch = ScratchDir::create(&dest.dir, &dest.identifier).map_err(|e| match e {
        PackageError::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            PackageError::InvalidDestination {
                path: config.output.clone(),
                reason: "directory is not writable".to_string(),
            }
        }
        other => other,
    })?;
    let tree = scratch.join("fmu");
    let sources = tree.join("sources");
    create_dir(&sources)?;
    write_file(&sources.join(SOURCE_FILE_NAME), &rendered.source)?;
    skeleton.install(&sources.join("include"))?;
    write_file(&tree.join(DESCRIPTOR_FILE_NAME), &rendered.descriptor)?;

    // Stage 4: Compile
    let build_dir = scratch.join("build");
    create_dir(&build_dir)?;
    let request = CompileRequest {
        sources_dir: &sources,
        build_dir: &build_dir,
        identifier: &dest.identifier,
        platform: config.platform,
    };
    let library = toolchain.compile(&request)?;
    if !library.is_file() {
        return Err(PackageError::MissingOutput { path: library });
    }

    let bin_dir = tree.join("binaries").join(config.platform.to_string());
    create_dir(&bin_dir)?;
    let installed = bin_dir.join(config.platform.library_name(&dest.identifier));
    fs::rename(&library, &installed)
        .map_err(PackageError::io(format!("moving {}", library.display())))?;

    if !config.keep_sources {
        fs::remove_dir_all(&sources)
            .map_err(PackageError::io(format!("removing {}", sources.display())))?;
    }

    // Stage 5: Archive
    let zip_path = scratch.join(format!("{}.zip", dest.identifier));
    let entries = write_archive(&tree, &zip_path)?;
    fs::rename(&zip_path, &config.output)
        .map_err(PackageError::io(format!("moving archive to {}", config.output.display())))?;
    drop(scratch);

    tracing::info!(archive = %config.output.display(), entries = entries.len(), "unit written");

    let layout = model.layout();
    Ok(BuildReport {
        identifier: dest.identifier,
        guid: rendered.identity.guid(),
        platform: config.platform,
        nx: model.nx(),
        nu: model.nu(),
        ny: model.ny(),
        nr: layout.register_count(),
        step_size: config.step_size,
        toolchain: toolchain.name(),
        archive: config.output.clone(),
        entries,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(PackageError::io(format!("creating {}", path.display())))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(PackageError::io(format!("writing {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_rules() {
        let dir = tempfile::tempdir().unwrap();
        let ok = check_destination(&dir.path().join("plant.fmu")).unwrap();
        assert_eq!(ok.identifier, "plant");
        assert_eq!(ok.dir, dir.path());

        for bad in ["plant.zip", "my-plant.fmu", "1plant.fmu", "plant"] {
            let err = check_destination(&dir.path().join(bad)).unwrap_err();
            assert!(
                matches!(err, PackageError::InvalidDestination { .. }),
                "{bad}: {err}"
            );
        }

        let err = check_destination(&dir.path().join("missing/plant.fmu")).unwrap_err();
        assert!(matches!(err, PackageError::InvalidDestination { .. }));
    }

    #[test]
    fn bare_file_name_uses_current_directory() {
        let dest = check_destination(Path::new("q.fmu")).unwrap();
        assert_eq!(dest.dir, PathBuf::from("."));
        assert_eq!(dest.identifier, "q");
    }

    #[test]
    fn render_shares_identity() {
        let model = ltifmu_model::ModelSpec::Pid(ltifmu_model::PidSpec {
            kp: 1.0,
            ..Default::default()
        })
        .realize()
        .unwrap();
        let rendered = render(&model, "q", DEFAULT_STEP_SIZE).unwrap();
        let guid = rendered.identity.guid().to_string();
        assert!(rendered.source.contains(&guid));
        assert!(rendered.descriptor.contains(&guid));
    }
}
