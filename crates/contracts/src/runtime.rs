//! Runtime records - Actor Factory output
//!
//! Handles of the actors created during provisioning.

use std::fmt;

use crate::SensorKind;

/// CARLA actor handle type
pub type ActorId = u32;

/// What a spawned actor is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Vehicle,
    Sensor(SensorKind),
}

impl ActorKind {
    /// Label used for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ActorKind::Vehicle => "vehicle",
            ActorKind::Sensor(kind) => kind.as_str(),
        }
    }
}

/// A successfully spawned actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    /// Simulator handle
    pub actor_id: ActorId,

    /// Simulator type identifier (e.g., "sensor.camera.rgb")
    pub type_id: String,

    pub kind: ActorKind,

    /// Role name, if the blueprint set one
    pub role_name: Option<String>,
}

impl ActorRecord {
    /// Report line printed after a successful spawn.
    ///
    /// Cameras also carry their role name, every other actor only its type.
    pub fn created_line(&self) -> String {
        match (&self.kind, &self.role_name) {
            (ActorKind::Sensor(SensorKind::Camera), Some(role)) => {
                format!("Created {} {}", self.type_id, role)
            }
            _ => format!("Created {}", self.type_id),
        }
    }
}

impl fmt::Display for ActorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_id, self.actor_id)
    }
}

/// Provisioning lifecycle.
///
/// `Disconnected -> Connected -> VehicleSpawned -> SensorsSpawned -> Idling -> TornDown`;
/// any failure after connecting jumps straight to `TornDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisionState {
    #[default]
    Disconnected,
    Connected,
    VehicleSpawned,
    SensorsSpawned,
    Idling,
    TornDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ActorKind, type_id: &str, role: Option<&str>) -> ActorRecord {
        ActorRecord {
            actor_id: 1000,
            type_id: type_id.into(),
            kind,
            role_name: role.map(str::to_string),
        }
    }

    #[test]
    fn camera_line_includes_role() {
        let cam = record(
            ActorKind::Sensor(SensorKind::Camera),
            "sensor.camera.rgb",
            Some("front_color"),
        );
        assert_eq!(cam.created_line(), "Created sensor.camera.rgb front_color");
    }

    #[test]
    fn other_lines_omit_role() {
        let vehicle = record(ActorKind::Vehicle, "vehicle.nissan.patrol", Some("hero"));
        assert_eq!(vehicle.created_line(), "Created vehicle.nissan.patrol");

        let gnss = record(
            ActorKind::Sensor(SensorKind::Gnss),
            "sensor.other.gnss",
            Some("gnss"),
        );
        assert_eq!(gnss.created_line(), "Created sensor.other.gnss");
    }
}
