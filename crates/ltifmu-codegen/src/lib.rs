//! Artifact generation for ltifmu.
//!
//! Turns a realized [`ltifmu_model::LtiModel`] and its register layout into
//! the two text artifacts of a unit: the C translation unit compiled against
//! the runtime skeleton, and the `modelDescription.xml` interface descriptor.
//! Both renderers are pure functions of their inputs.

pub mod descriptor;
pub mod error;
pub mod identity;
pub mod literal;
pub mod source;

pub use descriptor::{render_descriptor, DESCRIPTOR_FILE_NAME, LOG_CATEGORIES};
pub use error::{CodegenError, Result};
pub use identity::{is_c_identifier, BuildIdentity};
pub use source::{
    render_source, EULER_SUBSTEPS, SKELETON_HEADER, SKELETON_IMPLEMENTATION, SOURCE_FILE_NAME,
};
