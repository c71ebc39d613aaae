//! Built-in sensor rig
//!
//! One lidar on the roof, four wide-angle cameras covering the quadrants plus
//! a narrow color camera looking forward, and a GNSS receiver at the vehicle
//! origin.

use crate::{
    ActorBlueprint, ConnectionConfig, Location, RigSpec, Rotation, SensorDefinition, SensorKind,
    Transform, VehicleDefinition, ROLE_NAME_ATTRIBUTE,
};

pub const VEHICLE_BLUEPRINT: &str = "vehicle.nissan.patrol";
pub const VEHICLE_ROLE_NAME: &str = "hero";
pub const VEHICLE_COLOR: &str = "255,255,255";

pub const LIDAR_MOUNT_HEIGHT: f64 = 2.6;

/// Wide-angle camera field of view (degrees)
pub const WIDE_CAMERA_FOV: &str = "129";
/// Color camera field of view (degrees)
pub const NARROW_CAMERA_FOV: &str = "52";

pub const CAMERA_IMAGE_WIDTH: &str = "1280";
pub const CAMERA_IMAGE_HEIGHT: &str = "720";

/// Camera mount entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMount {
    pub role_name: &'static str,
    pub fov: &'static str,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

impl CameraMount {
    pub fn transform(&self) -> Transform {
        Transform::new(
            Location {
                x: self.x,
                y: self.y,
                z: self.z,
            },
            Rotation {
                yaw: self.yaw,
                ..Default::default()
            },
        )
    }
}

/// Cameras in spawn order.
///
/// The wide cameras are nudged 1 cm off the mount axis so that no two of
/// them share a position.
pub const CAMERA_MOUNTS: [CameraMount; 5] = [
    CameraMount {
        role_name: "front_color",
        fov: NARROW_CAMERA_FOV,
        x: 0.0,
        y: 0.01,
        z: 2.3,
        yaw: 0.0,
    },
    CameraMount {
        role_name: "front",
        fov: WIDE_CAMERA_FOV,
        x: 0.0,
        y: 0.01,
        z: 2.4,
        yaw: 0.0,
    },
    CameraMount {
        role_name: "right",
        fov: WIDE_CAMERA_FOV,
        x: 0.01,
        y: 0.0,
        z: 2.4,
        yaw: 90.0,
    },
    CameraMount {
        role_name: "back",
        fov: WIDE_CAMERA_FOV,
        x: 0.0,
        y: -0.01,
        z: 2.4,
        yaw: 180.0,
    },
    CameraMount {
        role_name: "left",
        fov: WIDE_CAMERA_FOV,
        x: -0.01,
        y: 0.0,
        z: 2.4,
        yaw: 270.0,
    },
];

impl RigSpec {
    /// The built-in rig against `localhost:2000`
    pub fn default_rig() -> Self {
        let mut sensors = Vec::with_capacity(2 + CAMERA_MOUNTS.len());
        sensors.push(lidar());
        sensors.extend(CAMERA_MOUNTS.iter().map(camera));
        sensors.push(gnss());

        Self {
            connection: ConnectionConfig::default(),
            vehicle: VehicleDefinition {
                blueprint: ActorBlueprint::new(VEHICLE_BLUEPRINT)
                    .with_attribute(ROLE_NAME_ATTRIBUTE, VEHICLE_ROLE_NAME)
                    .with_attribute("color", VEHICLE_COLOR),
                spawn_point: None,
            },
            sensors,
        }
    }
}

fn lidar() -> SensorDefinition {
    SensorDefinition {
        kind: SensorKind::Lidar,
        blueprint: ActorBlueprint::new(SensorKind::Lidar.default_blueprint())
            .with_attribute("channels", "40")
            // Far beyond any physical sensor; kept as-is for whole-map coverage.
            .with_attribute("range", "20000.0")
            .with_attribute("rotation_frequency", "10.0")
            .with_attribute("upper_fov", "7")
            .with_attribute("lower_fov", "-16"),
        transform: Transform::at(0.0, 0.0, LIDAR_MOUNT_HEIGHT),
    }
}

fn camera(mount: &CameraMount) -> SensorDefinition {
    SensorDefinition {
        kind: SensorKind::Camera,
        blueprint: ActorBlueprint::new(SensorKind::Camera.default_blueprint())
            .with_attribute(ROLE_NAME_ATTRIBUTE, mount.role_name)
            .with_attribute("image_size_x", CAMERA_IMAGE_WIDTH)
            .with_attribute("image_size_y", CAMERA_IMAGE_HEIGHT)
            .with_attribute("fov", mount.fov),
        transform: mount.transform(),
    }
}

fn gnss() -> SensorDefinition {
    SensorDefinition {
        kind: SensorKind::Gnss,
        blueprint: ActorBlueprint::new(SensorKind::Gnss.default_blueprint())
            .with_attribute(ROLE_NAME_ATTRIBUTE, "gnss"),
        transform: Transform::default(),
    }
}
