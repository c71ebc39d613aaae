//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use carla::client::{ActorBase, ActorBlueprint as CarlaBlueprint, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use contracts::{ActorBlueprint, ActorId, ConnectionConfig, Transform};
use tracing::{debug, info, instrument, warn};

use crate::client::{CarlaClient, SpawnedActor};
use crate::error::{ActorFactoryError, Result};

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements CarlaClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    client: Arc<Mutex<Option<Client>>>,
    world: Arc<Mutex<Option<World>>>,
    /// Spawned actors, kept alive until destroyed
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = self
            .world
            .lock()
            .map_err(|_| ActorFactoryError::NotConnected)?;
        let world = world_guard
            .as_mut()
            .ok_or(ActorFactoryError::NotConnected)?;
        f(world)
    }

    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        if let Ok(mut actors) = self.actors.lock() {
            actors.insert(actor_id, actor);
        }
    }

    fn parent_vehicle(&self, blueprint: &str, parent_id: ActorId) -> Result<Vehicle> {
        let actors = self
            .actors
            .lock()
            .map_err(|_| ActorFactoryError::spawn(blueprint, "actor registry poisoned"))?;
        match actors.get(&parent_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::spawn(
                blueprint,
                format!("parent vehicle {parent_id} not found"),
            )),
        }
    }

    /// Look up a blueprint and apply its attribute overrides
    fn resolve_blueprint(world: &mut World, blueprint: &ActorBlueprint) -> Result<CarlaBlueprint> {
        let library = world.blueprint_library();
        let mut resolved =
            library
                .find(&blueprint.id)
                .ok_or_else(|| ActorFactoryError::BlueprintNotFound {
                    blueprint: blueprint.id.clone(),
                })?;

        for (key, value) in &blueprint.attributes {
            if !resolved.set_attribute(key, value) {
                warn!(blueprint = %blueprint.id, key, value, "failed to set attribute");
            }
        }
        Ok(resolved)
    }

    fn create_vehicle(
        world: &mut World,
        blueprint: &ActorBlueprint,
        transform: &CarlaTransform,
    ) -> Result<Vehicle> {
        let vehicle_bp = Self::resolve_blueprint(world, blueprint)?;
        let actor = world
            .spawn_actor(&vehicle_bp, transform)
            .map_err(|e| ActorFactoryError::spawn(&blueprint.id, e.to_string()))?;

        Vehicle::try_from(actor)
            .map_err(|_| ActorFactoryError::spawn(&blueprint.id, "spawned actor is not a vehicle"))
    }

    fn create_sensor(
        world: &mut World,
        blueprint: &ActorBlueprint,
        transform: &CarlaTransform,
        parent: &Vehicle,
    ) -> Result<Sensor> {
        let sensor_bp = Self::resolve_blueprint(world, blueprint)?;
        let actor = world
            .spawn_actor_attached(&sensor_bp, transform, parent, None)
            .map_err(|e| ActorFactoryError::spawn(&blueprint.id, e.to_string()))?;

        Sensor::try_from(actor)
            .map_err(|_| ActorFactoryError::spawn(&blueprint.id, "spawned actor is not a sensor"))
    }

    fn destroy_vehicle_actor(vehicle: Vehicle, actor_id: ActorId) -> bool {
        let destroyed = vehicle.destroy();
        if !destroyed {
            warn!(actor_id, "destroy vehicle returned false");
        }
        destroyed
    }

    fn destroy_sensor_actor(sensor: Sensor, actor_id: ActorId) -> bool {
        if sensor.is_listening() {
            sensor.stop();
        }
        let destroyed = sensor.destroy();
        if !destroyed {
            warn!(actor_id, "destroy sensor returned false");
        }
        destroyed
    }

    /// Type id as reported by the server; the requested blueprint id if the
    /// server reports none
    fn reported_type_id(reported: String, blueprint: &ActorBlueprint) -> String {
        if reported.is_empty() {
            blueprint.id.clone()
        } else {
            reported
        }
    }

    fn to_carla_transform(transform: &Transform) -> CarlaTransform {
        CarlaTransform {
            location: Location {
                x: transform.location.x as f32,
                y: transform.location.y as f32,
                z: transform.location.z as f32,
            },
            rotation: Rotation {
                pitch: transform.rotation.pitch as f32,
                yaw: transform.rotation.yaw as f32,
                roll: transform.rotation.roll as f32,
            },
        }
    }

    fn from_carla_transform(transform: &CarlaTransform) -> Transform {
        Transform {
            location: contracts::Location {
                x: f64::from(transform.location.x),
                y: f64::from(transform.location.y),
                z: f64::from(transform.location.z),
            },
            rotation: contracts::Rotation {
                pitch: f64::from(transform.rotation.pitch),
                yaw: f64::from(transform.rotation.yaw),
                roll: f64::from(transform.rotation.roll),
            },
        }
    }
}

impl CarlaClient for RealCarlaClient {
    #[instrument(
        name = "real_carla_connect",
        skip(self, connection),
        fields(host = %connection.host, port = connection.port)
    )]
    async fn connect(&mut self, connection: &ConnectionConfig) -> Result<()> {
        let host = connection.host.clone();
        let port = connection.port;
        let timeout = connection.timeout();

        // The native client blocks and aborts by panicking when the server
        // is unreachable, so the handshake runs off the runtime thread.
        let handshake = tokio::task::spawn_blocking(move || {
            let mut client = Client::connect(&host, port, None);
            client.set_timeout(timeout);
            let world = client.world();
            (client, world)
        });

        let (client, world) = match tokio::time::timeout(timeout * 2, handshake).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => {
                return Err(ActorFactoryError::connection(
                    &connection.host,
                    connection.port,
                    format!("handshake aborted: {e}"),
                ))
            }
            Err(_) => {
                return Err(ActorFactoryError::connection(
                    &connection.host,
                    connection.port,
                    format!("timed out after {timeout:?}"),
                ))
            }
        };

        info!(map = %world.map().name(), "connected to CARLA server");

        *self
            .client
            .lock()
            .map_err(|_| ActorFactoryError::NotConnected)? = Some(client);
        *self
            .world
            .lock()
            .map_err(|_| ActorFactoryError::NotConnected)? = Some(world);

        Ok(())
    }

    #[instrument(name = "real_carla_spawn_points", skip(self))]
    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.with_world_mut(|world| {
            let points = world.map().recommended_spawn_points();
            Ok((0..)
                .map_while(|idx| points.get(idx))
                .map(Self::from_carla_transform)
                .collect())
        })
    }

    #[instrument(
        name = "real_carla_spawn_actor",
        skip(self, blueprint, transform),
        fields(blueprint = %blueprint.id)
    )]
    async fn spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: Transform,
        parent: Option<ActorId>,
    ) -> Result<SpawnedActor> {
        let carla_transform = Self::to_carla_transform(&transform);

        let (actor_id, reported, actor) = match parent {
            None => {
                let vehicle = self.with_world_mut(|world| {
                    Self::create_vehicle(world, blueprint, &carla_transform)
                })?;
                let reported = ActorBase::type_id(&vehicle);
                (vehicle.id(), reported, ActorType::Vehicle(vehicle))
            }
            Some(parent_id) => {
                let parent_vehicle = self.parent_vehicle(&blueprint.id, parent_id)?;
                let sensor = self.with_world_mut(|world| {
                    Self::create_sensor(world, blueprint, &carla_transform, &parent_vehicle)
                })?;
                let reported = ActorBase::type_id(&sensor);
                (sensor.id(), reported, ActorType::Sensor(sensor))
            }
        };

        let type_id = Self::reported_type_id(reported, blueprint);
        debug!(actor_id, %type_id, ?parent, "actor spawned");
        self.store_actor(actor_id, actor);

        Ok(SpawnedActor { actor_id, type_id })
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = self
            .actors
            .lock()
            .map_err(|_| ActorFactoryError::DestroyFailed {
                actor_id,
                message: "actor registry poisoned".into(),
            })?
            .remove(&actor_id);

        // Idempotent: Ok if the actor is unknown
        let destroyed = match removed {
            Some(ActorType::Vehicle(v)) => Self::destroy_vehicle_actor(v, actor_id),
            Some(ActorType::Sensor(s)) => Self::destroy_sensor_actor(s, actor_id),
            None => return Ok(()),
        };

        if destroyed {
            debug!(actor_id, "actor destroyed");
            Ok(())
        } else {
            Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "simulator refused to destroy actor".into(),
            })
        }
    }
}
