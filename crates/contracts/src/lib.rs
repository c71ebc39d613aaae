//! # Contracts
//!
//! Shared interface contracts for the rig provisioner: the rig description
//! handed to the actor factory, the runtime records it produces, and the
//! layered error type every crate converts into.
//!
//! ## Frames
//! - Vehicle spawn poses are world-relative
//! - Sensor mount poses are relative to the parent vehicle
//! - Distances in meters, angles in degrees

mod blueprint;
mod error;
mod rig;
mod runtime;

pub use blueprint::*;
pub use error::*;
pub use rig::*;
pub use runtime::*;
