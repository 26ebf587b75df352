//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.

use crate::engine::EngineConfig;
use crate::validate::{validate_engine_config, ValidationResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the engine configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_ENGINE_CONFIG: &str = "ACAP_ENGINE_CONFIG";
pub const ENV_CONFIG_DIR: &str = "ACAP_CONFIG_DIR";

/// Standard config file name.
pub const ENGINE_FILENAME: &str = "engine.json";

/// Application name for XDG directories.
const APP_NAME: &str = "acap";

/// A loaded and validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedEngineConfig {
    pub config: EngineConfig,
    /// Path the config came from (None when using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve the engine config path.
///
/// 1. Explicit CLI path (if it exists)
/// 2. `ACAP_ENGINE_CONFIG` (direct path)
/// 3. `ACAP_CONFIG_DIR` + `engine.json`
/// 4. XDG config directory (`~/.config/acap/engine.json`)
/// 5. Built-in defaults (None)
pub fn resolve_engine_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_ENGINE_CONFIG) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(ENGINE_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(ENGINE_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Resolve, load, and validate the engine configuration.
///
/// An explicit CLI path that does not exist is an error rather than a silent
/// fallback to defaults.
pub fn load_engine_config(cli_path: Option<&Path>) -> ValidationResult<ResolvedEngineConfig> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(crate::ValidationError::IoError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    }

    let (path, source) = resolve_engine_config_path(cli_path);
    let config = match &path {
        Some(p) => {
            let config = EngineConfig::from_file(p)?;
            info!(event = "config.loaded", path = %p.display(), source = %source, "loaded engine config");
            config
        }
        None => {
            debug!(event = "config.default_used", "no engine config found, using defaults");
            EngineConfig::default()
        }
    };

    validate_engine_config(&config)?;

    Ok(ResolvedEngineConfig {
        config,
        path,
        source,
    })
}

/// Get the XDG config directory for acap.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
