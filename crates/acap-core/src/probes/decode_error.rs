use super::{names, release, PROBE_SAMPLE_RATE};
use crate::host::{AudioHost, HostError};
use crate::probe::{Probe, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Supported iff decoding empty data is rejected with a type error.
///
/// Hosts that report it as an encoding error, or that decode it, fail.
pub struct DecodeErrorProbe {
    host: Arc<dyn AudioHost>,
}

impl DecodeErrorProbe {
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        DecodeErrorProbe { host }
    }
}

#[async_trait]
impl Probe for DecodeErrorProbe {
    fn name(&self) -> &str {
        names::DECODE_ERROR_TYPE
    }

    async fn test(&self) -> ProbeResult {
        let context = self.host.create_offline_context(1, 1, PROBE_SAMPLE_RATE)?;
        let decoding = context.decode_audio_data(Vec::new());
        let outcome = decoding.await;
        release(context, names::DECODE_ERROR_TYPE);
        Ok(matches!(outcome, Err(HostError::TypeError(_))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ReferenceHost;
    use acap_config::HostDefect;

    #[tokio::test]
    async fn test_type_error_passes() {
        let host = Arc::new(ReferenceHost::new());
        assert!(DecodeErrorProbe::new(host.clone()).test().await.unwrap());
        assert_eq!(host.open_contexts(), 0);
    }

    #[tokio::test]
    async fn test_wrong_error_kind_fails() {
        let host = Arc::new(ReferenceHost::with_defects([HostDefect::DecodeErrorNotTypeError]));
        assert!(!DecodeErrorProbe::new(host).test().await.unwrap());
    }
}
