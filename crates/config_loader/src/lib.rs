//! # Config Loader
//!
//! Rig file loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON rig files
//! - Validate the rig
//! - Produce a `RigSpec`
//!
//! Without a file the built-in rig (`RigSpec::default_rig`) is used.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let rig = ConfigLoader::load_from_path(Path::new("rig.toml")).unwrap();
//! println!("Vehicle: {}", rig.vehicle.blueprint.id);
//! ```

mod parser;
mod validator;

pub use contracts::RigSpec;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Rig loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a rig from file path
    ///
    /// Format is detected from the extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RigSpec, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a rig from string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RigSpec, ContractError> {
        let rig = parser::parse(content, format)?;
        validator::validate(&rig)?;
        Ok(rig)
    }

    /// Validated built-in rig
    pub fn builtin() -> Result<RigSpec, ContractError> {
        let rig = RigSpec::default_rig();
        validator::validate(&rig)?;
        Ok(rig)
    }

    /// Validate an already constructed rig (e.g., after CLI overrides)
    pub fn validate(rig: &RigSpec) -> Result<(), ContractError> {
        validator::validate(rig)
    }

    pub fn to_toml(rig: &RigSpec) -> Result<String, ContractError> {
        toml::to_string_pretty(rig)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(rig: &RigSpec) -> Result<String, ContractError> {
        serde_json::to_string_pretty(rig)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
