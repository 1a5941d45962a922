//! Packaging errors.

use std::io;
use std::path::PathBuf;

use ltifmu_codegen::CodegenError;
use ltifmu_model::ModelError;
use thiserror::Error;

/// Errors that can occur while compiling and packaging a unit.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("unsupported platform or toolchain: {message}")]
    UnsupportedPlatformOrToolchain { message: String },

    #[error("compiler `{compiler}` failed ({status}):\n{stderr}")]
    CompileFailure {
        compiler: String,
        status: String,
        stderr: String,
    },

    #[error("compiler reported success but produced no library at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("invalid destination {}: {reason}", path.display())]
    InvalidDestination { path: PathBuf, reason: String },

    /// A previous build left its scratch directory behind.
    #[error("scratch directory {} already exists; remove it or wait for the other build", path.display())]
    ScratchExists { path: PathBuf },

    #[error("runtime skeleton at {}: {reason}", dir.display())]
    RuntimeSkeleton { dir: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PackageError {
    /// Adapter for `map_err` on filesystem calls.
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| PackageError::Io { context, source }
    }
}

/// Result type for packaging.
pub type Result<T> = std::result::Result<T, PackageError>;
