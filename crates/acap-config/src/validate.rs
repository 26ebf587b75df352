//! Configuration validation errors and semantic validation.

use crate::engine::EngineConfig;
use acap_common::BaselineFlag;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted async stage timeout (ten minutes).
pub const MAX_ASYNC_STAGE_TIMEOUT_MS: u64 = 600_000;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for acap_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::VersionMismatch { .. } => {
                acap_common::Error::SchemaValidation(err.to_string())
            }
            other => acap_common::Error::InvalidEngineConfig(other.to_string()),
        }
    }
}

/// Validate engine configuration semantically.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if let Some(timeout_ms) = config.async_stage_timeout_ms {
        if timeout_ms == 0 || timeout_ms > MAX_ASYNC_STAGE_TIMEOUT_MS {
            return Err(ValidationError::InvalidValue {
                field: "async_stage_timeout_ms".to_string(),
                message: format!(
                    "must be within 1..={}, got {}",
                    MAX_ASYNC_STAGE_TIMEOUT_MS, timeout_ms
                ),
            });
        }
    }

    for flag in BaselineFlag::ALL {
        if config.baseline_overrides.get(flag) == Some(true) {
            return Err(ValidationError::InvalidValue {
                field: format!("baseline_overrides.{}", flag),
                message: "overrides can only disable a baseline flag".to_string(),
            });
        }
    }

    for (idx, name) in config.disabled_probes.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("disabled_probes[{}]", idx),
                message: "probe name must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
