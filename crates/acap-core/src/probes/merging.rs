use super::{names, release, PROBE_SAMPLE_RATE};
use crate::host::AudioHost;
use crate::probe::{Probe, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Supported iff an impulse fed to merger input 0 lands on output channel 0
/// and output channel 1 stays silent.
pub struct MergingProbe {
    host: Arc<dyn AudioHost>,
}

impl MergingProbe {
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        MergingProbe { host }
    }
}

#[async_trait]
impl Probe for MergingProbe {
    fn name(&self) -> &str {
        names::MERGING
    }

    async fn test(&self) -> ProbeResult {
        let context = self.host.create_offline_context(2, 1, PROBE_SAMPLE_RATE)?;
        let rendering = context.render_merged_impulse();
        let rendered = rendering.await;
        release(context, names::MERGING);

        let channels = rendered?;
        let first = channels.first().and_then(|c| c.first()).copied();
        let second = channels.get(1).and_then(|c| c.first()).copied();
        Ok(first == Some(1.0) && second == Some(0.0))
    }
}
