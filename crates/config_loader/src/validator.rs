//! Rig 校验
//!
//! 校验规则：
//! - connection：host 非空，port > 0，timeout > 0
//! - 车辆 blueprint 以 `vehicle.` 开头
//! - 传感器 blueprint 以 `sensor.` 开头
//! - 属性名非空
//! - 传感器 role name 唯一

use std::collections::HashSet;

use contracts::{ActorBlueprint, ContractError, RigSpec};
use validator::Validate;

/// 校验 RigSpec
///
/// 返回遇到的第一个错误。
pub fn validate(rig: &RigSpec) -> Result<(), ContractError> {
    validate_connection(rig)?;
    validate_vehicle(rig)?;
    validate_sensor_blueprints(rig)?;
    validate_role_names(rig)?;
    Ok(())
}

fn validate_connection(rig: &RigSpec) -> Result<(), ContractError> {
    rig.connection
        .validate()
        .map_err(|e| ContractError::config_validation("connection", e.to_string()))
}

fn validate_vehicle(rig: &RigSpec) -> Result<(), ContractError> {
    validate_blueprint("vehicle.blueprint", &rig.vehicle.blueprint, "vehicle.")
}

fn validate_sensor_blueprints(rig: &RigSpec) -> Result<(), ContractError> {
    for (idx, sensor) in rig.sensors.iter().enumerate() {
        validate_blueprint(
            &format!("sensors[{idx}].blueprint"),
            &sensor.blueprint,
            "sensor.",
        )?;
    }
    Ok(())
}

fn validate_blueprint(
    field: &str,
    blueprint: &ActorBlueprint,
    prefix: &str,
) -> Result<(), ContractError> {
    if blueprint.id.is_empty() {
        return Err(ContractError::config_validation(
            format!("{field}.id"),
            "blueprint id cannot be empty",
        ));
    }
    if !blueprint.id.starts_with(prefix) {
        return Err(ContractError::config_validation(
            format!("{field}.id"),
            format!("blueprint '{}' must start with '{prefix}'", blueprint.id),
        ));
    }
    if blueprint.attributes.keys().any(String::is_empty) {
        return Err(ContractError::config_validation(
            format!("{field}.attributes"),
            "attribute name cannot be empty",
        ));
    }
    Ok(())
}

/// role name 用于区分传感器，不允许重复
fn validate_role_names(rig: &RigSpec) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sensor) in rig.sensors.iter().enumerate() {
        if let Some(role) = sensor.role_name() {
            if !seen.insert(role) {
                return Err(ContractError::config_validation(
                    format!("sensors[{idx}].blueprint.attributes.role_name"),
                    format!("duplicate role_name '{role}'"),
                ));
            }
        }
    }
    Ok(())
}
