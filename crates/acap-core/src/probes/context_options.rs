use super::{names, release};
use crate::host::{AudioHost, ContextOptions, LatencyHint};
use crate::probe::{Probe, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Supported iff a realtime context accepts a latency hint at construction.
pub struct ContextOptionsProbe {
    host: Arc<dyn AudioHost>,
}

impl ContextOptionsProbe {
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        ContextOptionsProbe { host }
    }
}

#[async_trait]
impl Probe for ContextOptionsProbe {
    fn name(&self) -> &str {
        names::CONTEXT_OPTIONS
    }

    async fn test(&self) -> ProbeResult {
        let options = ContextOptions {
            latency_hint: Some(LatencyHint::Balanced),
            sample_rate: None,
        };
        match self.host.create_context(&options) {
            Ok(context) => {
                release(context, names::CONTEXT_OPTIONS);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ReferenceHost;
    use acap_config::HostDefect;

    #[tokio::test]
    async fn test_accepting_host_passes_and_closes() {
        let host = Arc::new(ReferenceHost::new());
        let probe = ContextOptionsProbe::new(host.clone());
        assert!(probe.test().await.unwrap());
        assert_eq!(host.open_contexts(), 0);
    }

    #[tokio::test]
    async fn test_rejecting_host_fails() {
        let host = Arc::new(ReferenceHost::with_defects([HostDefect::RejectsContextOptions]));
        assert!(!ContextOptionsProbe::new(host).test().await.unwrap());
    }
}
