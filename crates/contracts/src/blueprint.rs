//! RigSpec - Config Loader 输出
//!
//! 描述连接参数、唯一的车辆以及挂载在车上的有序传感器列表。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

/// 存放 actor role name 的属性
pub const ROLE_NAME_ATTRIBUTE: &str = "role_name";

/// Blueprint 标识符及 spawn 前设置的属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorBlueprint {
    /// Catalog 标识符（如 "sensor.camera.rgb"）
    pub id: String,

    /// 属性名 -> 值，按 key 顺序设置
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ActorBlueprint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder 风格设置属性，同名 key 以后设置的为准
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn role_name(&self) -> Option<&str> {
        self.attribute(ROLE_NAME_ATTRIBUTE)
    }
}

/// 3D 变换：位置 + 旋转
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z)，单位米
    #[serde(default)]
    pub location: Location,

    /// 旋转 (pitch, yaw, roll)，单位度
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// 纯平移，无旋转
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Location { x, y, z }, Rotation::default())
    }

    /// 替换 yaw 后的同一变换
    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.rotation.yaw = yaw;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// 模拟器连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConnectionConfig {
    /// CARLA 服务器地址
    #[serde(default = "default_carla_host")]
    #[validate(length(min = 1, message = "host cannot be empty"))]
    pub host: String,

    /// CARLA 服务器端口
    #[serde(default = "default_carla_port")]
    #[validate(range(min = 1, message = "port must be > 0"))]
    pub port: u16,

    /// 客户端超时（秒）
    #[serde(default = "default_timeout_secs")]
    #[validate(range(exclusive_min = 0.0, message = "timeout_secs must be > 0"))]
    pub timeout_secs: f64,
}

fn default_carla_host() -> String {
    "localhost".to_string()
}

fn default_carla_port() -> u16 {
    2000
}

fn default_timeout_secs() -> f64 {
    2.0
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.max(0.0))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_carla_host(),
            port: default_carla_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 车辆定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDefinition {
    /// 车辆 blueprint 及属性（role name、颜色）
    pub blueprint: ActorBlueprint,

    /// 世界坐标位姿，None 时使用地图第一个 spawn point
    #[serde(default)]
    pub spawn_point: Option<Transform>,
}

/// 传感器定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDefinition {
    /// 传感器类型
    pub kind: SensorKind,

    /// 传感器 blueprint 及属性
    pub blueprint: ActorBlueprint,

    /// 相对车辆的安装位姿
    #[serde(default)]
    pub transform: Transform,
}

impl SensorDefinition {
    pub fn role_name(&self) -> Option<&str> {
        self.blueprint.role_name()
    }
}

/// 传感器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Camera,
    Lidar,
    Gnss,
}

impl SensorKind {
    /// 该类型默认的 CARLA blueprint
    pub fn default_blueprint(self) -> &'static str {
        match self {
            SensorKind::Camera => "sensor.camera.rgb",
            SensorKind::Lidar => "sensor.lidar.ray_cast",
            SensorKind::Gnss => "sensor.other.gnss",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Camera => "camera",
            SensorKind::Lidar => "lidar",
            SensorKind::Gnss => "gnss",
        }
    }
}

/// 完整 rig：一辆车，所有传感器都挂载在车上
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigSpec {
    #[serde(default)]
    pub connection: ConnectionConfig,

    pub vehicle: VehicleDefinition,

    /// 按 spawn 顺序排列的传感器
    #[serde(default)]
    pub sensors: Vec<SensorDefinition>,
}

impl RigSpec {
    /// 成功 spawn 后的 actor 总数
    pub fn actor_count(&self) -> usize {
        1 + self.sensors.len()
    }

    pub fn sensors_of_kind(&self, kind: SensorKind) -> impl Iterator<Item = &SensorDefinition> {
        self.sensors.iter().filter(move |sensor| sensor.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_attribute_overrides_earlier() {
        let bp = ActorBlueprint::new("sensor.camera.rgb")
            .with_attribute("fov", "129")
            .with_attribute("fov", "52");
        assert_eq!(bp.attribute("fov"), Some("52"));
        assert_eq!(bp.attributes.len(), 1);
    }

    #[test]
    fn connection_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2000);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn connection_rejects_zero_timeout() {
        let config = ConnectionConfig {
            timeout_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn transform_fields_default_when_missing() {
        let t: Transform = serde_json::from_str(r#"{ "location": { "z": 2.6 } }"#).unwrap();
        assert_eq!(t, Transform::at(0.0, 0.0, 2.6));
    }

    #[test]
    fn sensor_kind_blueprints() {
        assert_eq!(SensorKind::Lidar.default_blueprint(), "sensor.lidar.ray_cast");
        assert_eq!(SensorKind::Gnss.default_blueprint(), "sensor.other.gnss");
        assert_eq!(SensorKind::Camera.as_str(), "camera");
    }
}
