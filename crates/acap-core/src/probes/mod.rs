//! Concrete audio capability probes.
//!
//! Each probe exercises one behavior of an [`AudioHost`] and always closes
//! the contexts it opens.

mod close;
mod context_options;
mod decode_error;
mod merging;

pub use close::CloseProbe;
pub use context_options::ContextOptionsProbe;
pub use decode_error::DecodeErrorProbe;
pub use merging::MergingProbe;

use crate::host::AudioContextHandle;
use tracing::debug;

/// Stable probe names, also accepted in `disabled_probes`.
pub mod names {
    pub const CONTEXT_OPTIONS: &str = "context_options";
    pub const CLOSE: &str = "close";
    pub const DECODE_ERROR_TYPE: &str = "decode_error_type";
    pub const MERGING: &str = "merging";

    /// All standard probe names in wiring order.
    pub const ALL: [&str; 4] = [CONTEXT_OPTIONS, CLOSE, DECODE_ERROR_TYPE, MERGING];
}

/// Sample rate used for the offline contexts the probes render with.
pub(crate) const PROBE_SAMPLE_RATE: f32 = 44_100.0;

/// Close a context the probe no longer needs. A failing close does not change
/// the outcome of probes other than [`CloseProbe`].
pub(crate) fn release(context: Box<dyn AudioContextHandle>, probe: &str) {
    if let Err(err) = context.close() {
        debug!(probe, error = %err, "transient context could not be closed");
    }
}
