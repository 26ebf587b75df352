//! Structured event vocabulary for logging.
//!
//! Event names are recorded in an `event` field so JSONL consumers can filter
//! on a stable key.

use serde::{Deserialize, Serialize};

/// Log levels as rendered in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Evaluation stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Baseline flag check.
    Baseline,
    /// Sequential, short-circuiting probes.
    SyncProbes,
    /// Concurrently launched probes.
    AsyncProbes,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Baseline => "baseline",
            Stage::SyncProbes => "sync_probes",
            Stage::AsyncProbes => "async_probes",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Verdict lifecycle
    pub const VERDICT_REQUESTED: &str = "verdict.requested";
    pub const VERDICT_RESOLVED: &str = "verdict.resolved";

    // Stage transitions
    pub const BASELINE_UNAVAILABLE: &str = "baseline.unavailable";
    pub const STAGE_STARTED: &str = "stage.started";
    pub const STAGE_SHORT_CIRCUIT: &str = "stage.short_circuit";

    // Probe execution
    pub const PROBE_STARTED: &str = "probe.started";
    pub const PROBE_CACHE_HIT: &str = "probe.cache_hit";
    pub const PROBE_RESOLVED: &str = "probe.resolved";
    pub const PROBE_FAILED: &str = "probe.failed";

    // Config (emitted by acap-config)
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::Baseline, Stage::SyncProbes, Stage::AsyncProbes] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
    }

    #[test]
    fn test_event_names_are_dotted() {
        for name in [
            event_names::VERDICT_REQUESTED,
            event_names::PROBE_FAILED,
            event_names::STAGE_SHORT_CIRCUIT,
        ] {
            assert!(name.contains('.'), "{name} should be namespaced");
        }
    }
}
