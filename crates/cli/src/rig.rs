//! Effective rig resolution: built-in or file, then CLI overrides.

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::RigSpec;
use tracing::info;

use crate::error::{CliError, Result};

/// Connection overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<f64>,
}

/// Load the rig from `config`, or the built-in rig, and apply overrides.
///
/// The result is validated after the overrides so a bad `--port 0` is
/// caught before connecting.
pub fn load_rig(config: Option<&Path>, overrides: &ConnectionOverrides) -> Result<RigSpec> {
    let mut rig = match config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading rig file");
            ConfigLoader::load_from_path(path)?
        }
        None => ConfigLoader::builtin()?,
    };

    if let Some(host) = &overrides.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        rig.connection.host = host.clone();
    }
    if let Some(port) = overrides.port {
        info!(port, "Overriding CARLA port from CLI");
        rig.connection.port = port;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        info!(timeout_secs, "Overriding client timeout from CLI");
        rig.connection.timeout_secs = timeout_secs;
    }

    ConfigLoader::validate(&rig)?;
    Ok(rig)
}

/// Human-readable rig table (stdout)
pub fn print_rig_summary(rig: &RigSpec) {
    println!("\n=== Rig Summary ===\n");
    println!(
        "CARLA: {}:{} (timeout {}s)",
        rig.connection.host, rig.connection.port, rig.connection.timeout_secs
    );
    let spawn = match rig.vehicle.spawn_point {
        Some(t) => format!(
            "({:.2}, {:.2}, {:.2}) yaw {:.1}",
            t.location.x, t.location.y, t.location.z, t.rotation.yaw
        ),
        None => "first map spawn point".to_string(),
    };
    println!("\nVehicle: {} at {}", rig.vehicle.blueprint.id, spawn);
    print_attributes(&rig.vehicle.blueprint.attributes);

    println!("\nSensors ({}):", rig.sensors.len());
    for sensor in &rig.sensors {
        let t = sensor.transform;
        println!(
            "  - {:<7} {:<22} {:<12} xyz=({:.2}, {:.2}, {:.2}) yaw={:.0}",
            sensor.kind.as_str(),
            sensor.blueprint.id,
            sensor.role_name().unwrap_or("-"),
            t.location.x,
            t.location.y,
            t.location.z,
            t.rotation.yaw
        );
    }
    println!();
}

fn print_attributes(attributes: &std::collections::BTreeMap<String, String>) {
    for (key, value) in attributes {
        println!("    {key} = {value}");
    }
}
