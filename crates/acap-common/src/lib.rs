//! Audio capability probe common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Opaque probe identities and evaluation stages
//! - Baseline platform flags and their source trait
//! - Common error types and the probe failure taxonomy
//! - Output format selection

pub mod error;
pub mod flags;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, ProbeFailure, Result};
pub use flags::{BaselineFlag, BaselineFlags, FeatureFlagSource};
pub use id::{ProbeId, ProbeStage};
pub use output::OutputFormat;

/// Schema version for verdict reports and configuration files.
pub const SCHEMA_VERSION: &str = "1.0.0";
