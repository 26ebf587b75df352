//! Typed engine configuration (`engine.json`).

use crate::validate::ValidationError;
use acap_common::{BaselineFlag, BaselineFlags};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Schema version of the file.
    pub schema_version: String,

    /// Upper bound for each asynchronous-stage probe. `None` waits forever.
    #[serde(default)]
    pub async_stage_timeout_ms: Option<u64>,

    /// Forward probe failures to the tracing observer.
    #[serde(default = "default_true")]
    pub report_probe_failures: bool,

    /// Baseline flag overrides (can only force a flag off).
    #[serde(default)]
    pub baseline_overrides: BaselineOverrides,

    /// Probe names removed from their stage.
    #[serde(default)]
    pub disabled_probes: Vec<String>,

    /// Settings for the built-in software reference host.
    #[serde(default)]
    pub reference_host: ReferenceHostConfig,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            async_stage_timeout_ms: None,
            report_probe_failures: true,
            baseline_overrides: BaselineOverrides::default(),
            disabled_probes: Vec::new(),
            reference_host: ReferenceHostConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Async stage timeout as a duration.
    pub fn async_stage_timeout(&self) -> Option<Duration> {
        self.async_stage_timeout_ms.map(Duration::from_millis)
    }

    /// Whether a probe is disabled by name.
    pub fn is_disabled(&self, probe_name: &str) -> bool {
        self.disabled_probes.iter().any(|name| name == probe_name)
    }
}

/// Per-flag overrides. `Some(false)` forces the flag off; `None` keeps the detected value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineOverrides {
    #[serde(default)]
    pub promises: Option<bool>,
    #[serde(default)]
    pub typed_arrays: Option<bool>,
    #[serde(default)]
    pub web_audio: Option<bool>,
}

impl BaselineOverrides {
    /// Override for a single flag.
    pub fn get(&self, flag: BaselineFlag) -> Option<bool> {
        match flag {
            BaselineFlag::Promises => self.promises,
            BaselineFlag::TypedArrays => self.typed_arrays,
            BaselineFlag::WebAudio => self.web_audio,
        }
    }

    /// Apply the overrides to detected flags.
    pub fn apply(&self, detected: BaselineFlags) -> BaselineFlags {
        BaselineFlags {
            promises: detected.promises && self.promises.unwrap_or(true),
            typed_arrays: detected.typed_arrays && self.typed_arrays.unwrap_or(true),
            web_audio: detected.web_audio && self.web_audio.unwrap_or(true),
        }
    }
}

/// Defects the software reference host can emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostDefect {
    /// Context construction fails when options are passed.
    RejectsContextOptions,
    /// Contexts cannot be closed.
    CloseUnsupported,
    /// Decoding invalid data fails with an encoding error instead of a type error.
    DecodeErrorNotTypeError,
    /// The channel merger drops its input and renders silence.
    MergerDropsInput,
    /// Decoding never settles.
    DecodeNeverSettles,
}

impl std::fmt::Display for HostDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HostDefect::RejectsContextOptions => "rejects_context_options",
            HostDefect::CloseUnsupported => "close_unsupported",
            HostDefect::DecodeErrorNotTypeError => "decode_error_not_type_error",
            HostDefect::MergerDropsInput => "merger_drops_input",
            HostDefect::DecodeNeverSettles => "decode_never_settles",
        };
        write!(f, "{}", s)
    }
}

/// Reference host settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceHostConfig {
    #[serde(default)]
    pub defects: Vec<HostDefect>,
}
