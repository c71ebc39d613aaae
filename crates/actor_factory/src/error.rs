//! Actor Factory error types

use contracts::{ActorId, ContractError};
use thiserror::Error;

/// Actor Factory specific error
#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// Server unreachable or handshake timed out
    #[error("failed to connect to CARLA at {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Client used before `connect`
    #[error("not connected to CARLA server")]
    NotConnected,

    /// Blueprint identifier missing from the catalog
    #[error("blueprint '{blueprint}' not found in library")]
    BlueprintNotFound { blueprint: String },

    /// Simulator rejected the spawn (collision, bad pose, bad parent)
    #[error("failed to spawn '{blueprint}': {message}")]
    SpawnFailed { blueprint: String, message: String },

    /// Map offers no spawn point for the vehicle
    #[error("map has no spawn points for '{blueprint}'")]
    NoSpawnPoints { blueprint: String },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    pub fn connection(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    pub fn spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Nothing was created, so there is nothing to tear down
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::NotConnected)
    }

    /// Blueprint identifier could not be resolved
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::BlueprintNotFound { .. })
    }

    /// Simulator refused to instantiate the actor
    pub fn is_instantiation(&self) -> bool {
        matches!(self, Self::SpawnFailed { .. } | Self::NoSpawnPoints { .. })
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ActorFactoryError>;
