//! Observability hook for probe failures.

use crate::logging::event_names;
use acap_common::{ProbeFailure, ProbeId};

/// Receives `(probe identity, failure)` pairs when a probe errors, panics,
/// or times out. Implementations must not panic.
pub trait FailureObserver: Send + Sync {
    fn probe_failed(&self, probe: ProbeId, name: &str, failure: &ProbeFailure);
}

/// Default observer: logs failures through `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn probe_failed(&self, probe: ProbeId, name: &str, failure: &ProbeFailure) {
        tracing::warn!(
            event = event_names::PROBE_FAILED,
            probe_id = %probe,
            probe = name,
            error = %failure,
            "probe failed; counted as unsupported"
        );
    }
}
