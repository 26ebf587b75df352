//! Audio capability probe configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for engine.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod engine;
pub mod resolve;
pub mod validate;

pub use engine::{BaselineOverrides, EngineConfig, HostDefect, ReferenceHostConfig};
pub use resolve::{load_engine_config, resolve_engine_config_path, ConfigSource, ResolvedEngineConfig};
pub use validate::{validate_engine_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = acap_common::SCHEMA_VERSION;
