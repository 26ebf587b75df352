//! Engine construction and the single per-process verdict.

use crate::cache::{CacheStats, EntryState, MemoizationCache};
use crate::evaluator::ComposeEvaluator;
use crate::observer::FailureObserver;
use crate::probe::{Probe, ProbeDescriptor, RegisteredProbe};
use crate::token::{CapabilityToken, TokenState};
use acap_common::{Error, FeatureFlagSource, ProbeId, ProbeStage, Result};
use futures::future::BoxFuture;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Owns the probes, their cache and the lazily started verdict.
///
/// Construct exactly one per process to get "compute once per process"
/// semantics; separate engines share nothing.
pub struct Engine {
    evaluator: Arc<ComposeEvaluator>,
    token: OnceLock<CapabilityToken>,
}

impl Engine {
    pub fn builder(flags: impl FeatureFlagSource + 'static) -> EngineBuilder {
        EngineBuilder::new(Arc::new(flags))
    }

    /// The shared verdict handle. The first call starts the pipeline; later
    /// calls return a handle to the same evaluation.
    pub fn capability_token(&self) -> CapabilityToken {
        self.token
            .get_or_init(|| CapabilityToken::start(Arc::clone(&self.evaluator)))
            .clone()
    }

    pub fn token_state(&self) -> TokenState {
        match self.token.get() {
            Some(token) => token.state(),
            None => TokenState::Unrequested,
        }
    }

    /// Registered probes, sync stage first, in declared order.
    pub fn probes(&self) -> Vec<ProbeDescriptor> {
        self.evaluator.probes().map(RegisteredProbe::descriptor).collect()
    }

    /// Memoized result of a single probe.
    ///
    /// Shares the cache with the verdict pipeline, so a probe requested here
    /// and by the pipeline still runs once.
    pub fn probe_result(&self, id: ProbeId) -> Result<BoxFuture<'static, bool>> {
        let probe = self
            .evaluator
            .probes()
            .find(|probe| probe.id == id)
            .ok_or_else(|| Error::UnknownProbe {
                name: id.to_string(),
            })?;
        Ok(self.evaluator.run_memoized(probe))
    }

    /// Cache state of a single probe, `None` if it has not been requested.
    pub fn probe_state(&self, id: ProbeId) -> Option<EntryState> {
        self.evaluator.cache().state(id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.evaluator.cache().stats()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("probes", &self.probes())
            .field("token", &self.token_state())
            .finish()
    }
}

/// Explicit wiring of flags, probes and observer.
pub struct EngineBuilder {
    flags: Arc<dyn FeatureFlagSource>,
    sync_probes: Vec<RegisteredProbe>,
    async_probes: Vec<RegisteredProbe>,
    observer: Option<Arc<dyn FailureObserver>>,
    async_timeout: Option<Duration>,
    next_id: u32,
}

impl EngineBuilder {
    pub fn new(flags: Arc<dyn FeatureFlagSource>) -> Self {
        EngineBuilder {
            flags,
            sync_probes: Vec::new(),
            async_probes: Vec::new(),
            observer: None,
            async_timeout: None,
            next_id: 0,
        }
    }

    /// Register a probe and return its identity. Identities are unique per
    /// builder even when two probes share a name.
    pub fn register(&mut self, stage: ProbeStage, probe: Arc<dyn Probe>) -> ProbeId {
        let id = ProbeId::from_index(self.next_id);
        self.next_id += 1;
        let registered = RegisteredProbe { id, stage, probe };
        match stage {
            ProbeStage::Sync => self.sync_probes.push(registered),
            ProbeStage::Async => self.async_probes.push(registered),
        }
        id
    }

    pub fn with_sync_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.register(ProbeStage::Sync, Arc::new(probe));
        self
    }

    pub fn with_async_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.register(ProbeStage::Async, Arc::new(probe));
        self
    }

    /// Receiver of probe failures. Without one, failures are only traced at
    /// debug level.
    pub fn observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Bound each async-stage probe; a probe that exceeds it counts as `false`.
    pub fn async_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.async_timeout = timeout;
        self
    }

    pub fn build(self) -> Engine {
        let evaluator = ComposeEvaluator::new(
            self.flags,
            self.sync_probes,
            self.async_probes,
            MemoizationCache::new(self.observer),
            self.async_timeout,
        );
        Engine {
            evaluator: Arc::new(evaluator),
            token: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FnProbe;
    use acap_common::BaselineFlags;

    #[test]
    fn test_identities_follow_registration_order() {
        let mut builder = EngineBuilder::new(Arc::new(BaselineFlags::all_present()));
        let a = builder.register(ProbeStage::Async, Arc::new(FnProbe::new("dup", || Ok(true))));
        let b = builder.register(ProbeStage::Sync, Arc::new(FnProbe::new("dup", || Ok(true))));
        assert_ne!(a, b);

        let engine = builder.build();
        let probes = engine.probes();
        // Sync stage is listed first regardless of registration order
        assert_eq!(probes[0].id, b);
        assert_eq!(probes[1].id, a);
    }

    #[tokio::test]
    async fn test_token_unrequested_until_first_access() {
        let engine = Engine::builder(BaselineFlags::all_present())
            .with_sync_probe(FnProbe::new("s", || Ok(true)))
            .build();
        assert_eq!(engine.token_state(), TokenState::Unrequested);
        assert_eq!(engine.cache_stats().executions, 0);

        assert!(engine.capability_token().await);
        assert_eq!(engine.token_state(), TokenState::Resolved(true));
    }

    #[tokio::test]
    async fn test_probe_result_shares_the_pipeline_cache() {
        let engine = Engine::builder(BaselineFlags::all_present())
            .with_async_probe(FnProbe::new("a", || Ok(true)))
            .build();
        let id = engine.probes()[0].id;

        assert!(engine.probe_result(id).unwrap().await);
        assert!(engine.capability_token().await);
        assert_eq!(engine.cache_stats().executions, 1);
        assert_eq!(engine.probe_state(id), Some(EntryState::Resolved(true)));
    }

    #[test]
    fn test_unknown_probe_identity() {
        let engine = Engine::builder(BaselineFlags::all_present()).build();
        let err = engine.probe_result(ProbeId::from_index(9)).err().unwrap();
        assert_eq!(err.code(), 20);
    }
}
