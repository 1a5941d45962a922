//! Model realization for ltifmu.
//!
//! Reduces every supported model form (raw state space, transfer function,
//! zero-pole-gain, PID) to a validated [`LtiModel`] and assigns the register
//! layout shared by the generated source and the interface descriptor.

pub mod error;
pub mod layout;
pub mod model;
pub mod pid;
pub mod spec;
pub mod statespace;
pub mod transfer;

pub use error::{ModelError, Result};
pub use layout::{Block, VariableLayout};
pub use model::LtiModel;
pub use pid::GainPresence;
pub use spec::{ModelSpec, PidSpec, StateSpaceSpec, TransferFunctionSpec, ZeroPoleGainSpec};
