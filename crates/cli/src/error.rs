//! Error types for CLI operations.

use actor_factory::ActorFactoryError;
use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Rig file not found
    #[error("Rig file not found: {path}")]
    ConfigNotFound { path: String },

    /// Rig file could not be parsed or failed validation
    #[error("Invalid rig configuration: {0}")]
    Config(#[from] ContractError),

    /// Provisioning failed (connection, resolution or spawn)
    #[error("Provisioning failed: {0}")]
    Provision(#[from] ActorFactoryError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
