//! # Actor Factory
//!
//! CARLA actor provisioning.
//!
//! Responsibilities:
//! - Spawn the vehicle and its sensor rig from a `RigSpec`
//! - Track every created actor in an `ActorRegistry`
//! - Tear everything down on every exit path
//! - Abstract the simulator behind `CarlaClient` (real or mock)
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_client;
pub mod registry;

#[cfg(feature = "real-carla")]
pub mod carla_client;

pub use client::{CarlaClient, SpawnedActor};
pub use contracts::{ActorId, ActorRecord, ProvisionState, RigSpec};
pub use error::{ActorFactoryError, Result};
pub use factory::{ActorFactory, DESTROYED_LINE};
pub use mock_client::{MockCarlaClient, MockConfig};
pub use registry::ActorRegistry;

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
