//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::RigSpec;
use serde::Serialize;

use crate::cli::InfoArgs;
use crate::rig::{load_rig, print_rig_summary, ConnectionOverrides};

/// Rig info for JSON output
#[derive(Serialize)]
struct RigInfo {
    connection: ConnectionInfo,
    vehicle: ActorInfo,
    sensors: Vec<ActorInfo>,
}

#[derive(Serialize)]
struct ConnectionInfo {
    host: String,
    port: u16,
    timeout_secs: f64,
}

#[derive(Serialize)]
struct ActorInfo {
    kind: &'static str,
    blueprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_name: Option<String>,
    /// [x, y, z, pitch, yaw, roll]; absent for a map-selected spawn point
    #[serde(skip_serializing_if = "Option::is_none")]
    pose: Option<[f64; 6]>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let rig = load_rig(args.config.as_deref(), &ConnectionOverrides::default())
        .context("Failed to load rig")?;

    if args.json {
        let info = build_rig_info(&rig);
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize rig info")?;
        println!("{}", json);
    } else {
        print_rig_summary(&rig);
    }

    Ok(())
}

fn build_rig_info(rig: &RigSpec) -> RigInfo {
    let pose = |t: contracts::Transform| {
        [
            t.location.x,
            t.location.y,
            t.location.z,
            t.rotation.pitch,
            t.rotation.yaw,
            t.rotation.roll,
        ]
    };

    RigInfo {
        connection: ConnectionInfo {
            host: rig.connection.host.clone(),
            port: rig.connection.port,
            timeout_secs: rig.connection.timeout_secs,
        },
        vehicle: ActorInfo {
            kind: "vehicle",
            blueprint: rig.vehicle.blueprint.id.clone(),
            role_name: rig.vehicle.blueprint.role_name().map(str::to_string),
            pose: rig.vehicle.spawn_point.map(pose),
            attributes: rig.vehicle.blueprint.attributes.clone(),
        },
        sensors: rig
            .sensors
            .iter()
            .map(|sensor| ActorInfo {
                kind: sensor.kind.as_str(),
                blueprint: sensor.blueprint.id.clone(),
                role_name: sensor.role_name().map(str::to_string),
                pose: Some(pose(sensor.transform)),
                attributes: sensor.blueprint.attributes.clone(),
            })
            .collect(),
    }
}
