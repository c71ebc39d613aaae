//! Rig description errors

use thiserror::Error;

/// Errors raised while reading or checking a rig description
#[derive(Debug, Error)]
pub enum ContractError {
    /// Rig file could not be parsed or serialized
    #[error("rig parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rig parsed but a field is unusable
    #[error("invalid rig at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Parse error carrying the underlying decoder error
    pub fn config_parse_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Field path of a validation error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ConfigValidation { field, .. } => Some(field),
            _ => None,
        }
    }
}
