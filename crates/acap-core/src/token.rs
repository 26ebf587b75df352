//! The externally consumed support verdict.

use crate::evaluator::{ComposeEvaluator, Verdict};
use crate::logging::event_names;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Lifecycle of the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "supported", rename_all = "snake_case")]
pub enum TokenState {
    /// Nobody has asked for the verdict yet.
    Unrequested,
    /// Requested; the pipeline is running or waits for its first await.
    Pending,
    /// Terminal.
    Resolved(bool),
}

/// Shared, lazily started handle to the support verdict.
///
/// Every clone observes the same evaluation. Awaiting a token yields the
/// boolean verdict; [`CapabilityToken::verdict`] yields the full report.
#[derive(Clone)]
pub struct CapabilityToken {
    shared: Shared<BoxFuture<'static, Arc<Verdict>>>,
}

impl CapabilityToken {
    /// Start the pipeline.
    ///
    /// Inside a tokio runtime the first poll happens here, so the baseline and
    /// sync stages run and every async probe is launched before this returns.
    /// Outside one the request is only recorded and the pipeline starts on the
    /// first await, where probes can reach the runtime's timer and reactor.
    pub(crate) fn start(evaluator: Arc<ComposeEvaluator>) -> Self {
        let in_runtime = Handle::try_current().is_ok();
        tracing::debug!(
            event = event_names::VERDICT_REQUESTED,
            started_eagerly = in_runtime,
            "capability token requested for the first time"
        );
        let shared = async move { Arc::new(evaluator.evaluate().await) }
            .boxed()
            .shared();
        if in_runtime {
            let _ = shared.clone().now_or_never();
        }
        CapabilityToken { shared }
    }

    /// Wait for the verdict and return the full report.
    pub async fn verdict(&self) -> Arc<Verdict> {
        self.shared.clone().await
    }

    /// Wait for the verdict.
    pub async fn is_supported(&self) -> bool {
        self.verdict().await.supported
    }

    /// The verdict if it has already resolved.
    pub fn peek(&self) -> Option<bool> {
        self.shared.peek().map(|verdict| verdict.supported)
    }

    pub fn state(&self) -> TokenState {
        match self.peek() {
            Some(supported) => TokenState::Resolved(supported),
            None => TokenState::Pending,
        }
    }
}

impl IntoFuture for CapabilityToken {
    type Output = bool;
    type IntoFuture = BoxFuture<'static, bool>;

    fn into_future(self) -> Self::IntoFuture {
        self.shared.map(|verdict| verdict.supported).boxed()
    }
}

impl std::fmt::Debug for CapabilityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityToken")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoizationCache;
    use crate::probe::{FnProbe, RegisteredProbe};
    use acap_common::{BaselineFlags, ProbeId, ProbeStage};

    fn evaluator_with(async_probe: RegisteredProbe) -> Arc<ComposeEvaluator> {
        Arc::new(ComposeEvaluator::new(
            Arc::new(BaselineFlags::all_present()),
            Vec::new(),
            vec![async_probe],
            MemoizationCache::new(None),
            None,
        ))
    }

    #[tokio::test]
    async fn test_immediate_probes_resolve_during_start() {
        let token = CapabilityToken::start(evaluator_with(RegisteredProbe {
            id: ProbeId::from_index(0),
            stage: ProbeStage::Async,
            probe: Arc::new(FnProbe::new("ok", || Ok(true))),
        }));
        assert_eq!(token.state(), TokenState::Resolved(true));
        assert!(token.await);
    }

    #[test]
    fn test_start_outside_runtime_defers_pipeline() {
        let evaluator = evaluator_with(RegisteredProbe {
            id: ProbeId::from_index(0),
            stage: ProbeStage::Async,
            probe: Arc::new(FnProbe::new("ok", || Ok(true))),
        });
        let token = CapabilityToken::start(Arc::clone(&evaluator));

        assert_eq!(token.state(), TokenState::Pending);
        assert_eq!(evaluator.cache().stats().executions, 0);

        assert!(futures::executor::block_on(token.is_supported()));
        assert_eq!(token.state(), TokenState::Resolved(true));
        assert_eq!(evaluator.cache().stats().executions, 1);
    }

    #[test]
    fn test_state_serializes() {
        let json = serde_json::to_value(TokenState::Resolved(false)).unwrap();
        assert_eq!(json["state"], "resolved");
        assert_eq!(json["supported"], false);
        let json = serde_json::to_value(TokenState::Unrequested).unwrap();
        assert_eq!(json["state"], "unrequested");
    }
}
