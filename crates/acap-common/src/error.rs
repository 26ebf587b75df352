//! Error types for the audio capability probe.
//!
//! Two families live here:
//! - [`Error`]: the unified error for configuration, wiring, and I/O, with
//!   stable codes, categories, and remediation hints.
//! - [`ProbeFailure`]: why a single probe was downgraded to a negative result.
//!   Probe failures never surface as [`Error`]; they are absorbed at the
//!   memoization boundary and only reported to observers.
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 11,
//!   "category": "config",
//!   "message": "invalid engine config: async_stage_timeout_ms must be positive",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for audio capability probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Probe registration and engine wiring errors.
    Wiring,
    /// Defects in the evaluation pipeline itself.
    Internal,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Wiring => write!(f, "wiring"),
            ErrorCategory::Internal => write!(f, "internal"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("invalid engine config: {0}")]
    InvalidEngineConfig(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Wiring errors (20-29)
    #[error("unknown probe: {name}")]
    UnknownProbe { name: String },

    // Internal errors (30-39)
    #[error("evaluation pipeline defect: {0}")]
    Orchestration(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Wiring errors
    /// - 30-39: Internal errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidEngineConfig(_) => 11,
            Error::SchemaValidation(_) => 12,
            Error::UnknownProbe { .. } => 20,
            Error::Orchestration(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEngineConfig(_) | Error::SchemaValidation(_) => ErrorCategory::Config,
            Error::UnknownProbe { .. } => ErrorCategory::Wiring,
            Error::Orchestration(_) => ErrorCategory::Internal,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the user.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidEngineConfig(_) | Error::SchemaValidation(_) => true,
            Error::UnknownProbe { .. } => true,
            // A pipeline defect is a bug, not an environment condition
            Error::Orchestration(_) => false,
            Error::Io(_) | Error::Json(_) => true,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidEngineConfig(_) => "Invalid Engine Configuration",
            Error::SchemaValidation(_) => "Schema Validation Failed",
            Error::UnknownProbe { .. } => "Unknown Probe",
            Error::Orchestration(_) => "Internal Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidEngineConfig(_) => {
                "Run 'acap-core config show' to inspect the resolved configuration and fix engine.json."
            }
            Error::SchemaValidation(_) => {
                "Ensure engine.json declares the supported schema_version."
            }
            Error::UnknownProbe { .. } => {
                "Run 'acap-core probes' to list valid probe names for disabled_probes."
            }
            Error::Orchestration(_) => "This is a bug. Please report it with the JSONL log output.",
            Error::Io(_) => "Check that the config file exists and is readable.",
            Error::Json(_) => "The report could not be rendered as JSON. Retry with --format summary.",
        }
    }
}

/// Why a probe contributed a negative result without returning `false` itself.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// The probe returned an error.
    #[error("probe errored: {message}")]
    Errored { message: String },

    /// The probe panicked while being constructed or polled.
    #[error("probe panicked: {message}")]
    Panicked { message: String },

    /// The probe did not settle within the configured async stage timeout.
    #[error("probe timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },
}

impl ProbeFailure {
    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ProbeFailure::Panicked { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_categories() {
        let cases = [
            (Error::InvalidEngineConfig("x".into()), ErrorCategory::Config, 11),
            (Error::UnknownProbe { name: "x".into() }, ErrorCategory::Wiring, 20),
            (Error::Orchestration("x".into()), ErrorCategory::Internal, 30),
        ];
        for (err, category, code) in cases {
            assert_eq!(err.category(), category);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_orchestration_is_not_recoverable() {
        assert!(!Error::Orchestration("bad state".into()).is_recoverable());
        assert!(Error::InvalidEngineConfig("bad".into()).is_recoverable());
    }

    #[test]
    fn test_probe_failure_from_panic_payloads() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(
            ProbeFailure::from_panic(static_payload.as_ref()),
            ProbeFailure::Panicked {
                message: "boom".into()
            }
        );

        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(
            ProbeFailure::from_panic(owned_payload.as_ref()),
            ProbeFailure::Panicked {
                message: "owned".into()
            }
        );

        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert!(matches!(
            ProbeFailure::from_panic(other.as_ref()),
            ProbeFailure::Panicked { .. }
        ));
    }

    #[test]
    fn test_probe_failure_serializes_tagged() {
        let json = serde_json::to_value(ProbeFailure::TimedOut { after_ms: 250 }).unwrap();
        assert_eq!(json["kind"], "timed_out");
        assert_eq!(json["after_ms"], 250);
    }
}
