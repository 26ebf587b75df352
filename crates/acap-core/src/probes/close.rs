use super::names;
use crate::host::{AudioHost, ContextOptions};
use crate::probe::{Probe, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Supported iff a freshly created context can be closed.
///
/// Failing to create the context at all is an error, not a negative result.
pub struct CloseProbe {
    host: Arc<dyn AudioHost>,
}

impl CloseProbe {
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        CloseProbe { host }
    }
}

#[async_trait]
impl Probe for CloseProbe {
    fn name(&self) -> &str {
        names::CLOSE
    }

    async fn test(&self) -> ProbeResult {
        let context = self.host.create_context(&ContextOptions::default())?;
        Ok(context.close().is_ok())
    }
}
