//! Compilation and packaging for ltifmu.
//!
//! Takes a realized model through rendering, native compilation and zip
//! assembly into a `.fmu` archive at the requested destination. The native
//! compiler sits behind the [`Toolchain`] trait.

pub mod archive;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod report;
pub mod scratch;
pub mod skeleton;
pub mod toolchain;

pub use error::{PackageError, Result};
pub use pipeline::{build, check_destination, render, BuildConfig, Destination, Rendered};
pub use platform::{Os, PlatformId};
pub use report::BuildReport;
pub use skeleton::RuntimeSkeleton;
pub use toolchain::{default_compiler, CompileRequest, SystemToolchain, Toolchain};
