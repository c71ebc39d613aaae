//! CARLA client abstraction
//!
//! The simulator boundary: connection, blueprint resolution, spawning and
//! destruction. Implemented by the real client and by the mock used in tests.

use std::future::Future;

use contracts::{ActorBlueprint, ActorId, ConnectionConfig, Transform};

use crate::error::Result;

/// Actor returned by the simulator after a successful spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedActor {
    pub actor_id: ActorId,
    /// Simulator type identifier
    pub type_id: String,
}

/// CARLA client trait
///
/// Every call completes only once the simulator has acknowledged it; callers
/// issue them one at a time.
pub trait CarlaClient: Send + Sync {
    /// Connect to CARLA server
    ///
    /// Fails with `ConnectionFailed` if the server cannot be reached within
    /// `connection.timeout()`.
    fn connect(&mut self, connection: &ConnectionConfig) -> impl Future<Output = Result<()>> + Send;

    /// The map's predefined spawn points, in map order
    fn spawn_points(&self) -> impl Future<Output = Result<Vec<Transform>>> + Send;

    /// Resolve a blueprint, apply its attributes and spawn it
    ///
    /// # Arguments
    /// * `blueprint` - Catalog identifier plus attribute overrides
    /// * `transform` - World pose, or pose relative to `parent`
    /// * `parent` - Actor to attach to
    ///
    /// # Errors
    /// * `BlueprintNotFound` - identifier missing from the catalog
    /// * `SpawnFailed` - simulator rejected the spawn
    fn spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: Transform,
        parent: Option<ActorId>,
    ) -> impl Future<Output = Result<SpawnedActor>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;
}
