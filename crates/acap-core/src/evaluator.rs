//! Staged, cost-ordered evaluation of the support verdict.
//!
//! 1. Baseline flags (AND); any false resolves `false` before any probe runs.
//! 2. Sync-stage probes in declared order, stopping at the first false.
//! 3. All async-stage probes launched together, then AND-ed once settled.

use crate::cache::{MemoizationCache, ProbeComputation};
use crate::logging::{event_names, Stage};
use crate::probe::RegisteredProbe;
use acap_common::{BaselineFlag, BaselineFlags, FeatureFlagSource, ProbeFailure, ProbeId, ProbeStage};
use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why the verdict came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Every stage passed.
    Supported,
    /// A baseline flag was false; no probe ran.
    BaselineUnavailable { flag: BaselineFlag },
    /// A sync-stage probe was negative; later probes did not run.
    SyncProbeNegative { probe: String },
    /// One or more async-stage probes were negative.
    AsyncProbesNegative { probes: Vec<String> },
}

/// Contribution of one probe to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub id: ProbeId,
    pub name: String,
    pub stage: ProbeStage,
    pub passed: bool,
}

/// The resolved support verdict and how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub supported: bool,
    pub decision: Decision,
    pub baseline: BaselineFlags,
    /// Probes that contributed, in evaluation order.
    pub probes: Vec<ProbeOutcome>,
    pub decided_at: String,
    pub elapsed_ms: u64,
}

/// Orchestrates the three evaluation stages over a shared cache.
pub struct ComposeEvaluator {
    flags: Arc<dyn FeatureFlagSource>,
    sync_probes: Vec<RegisteredProbe>,
    async_probes: Vec<RegisteredProbe>,
    cache: MemoizationCache,
    async_timeout: Option<Duration>,
}

impl ComposeEvaluator {
    pub fn new(
        flags: Arc<dyn FeatureFlagSource>,
        sync_probes: Vec<RegisteredProbe>,
        async_probes: Vec<RegisteredProbe>,
        cache: MemoizationCache,
        async_timeout: Option<Duration>,
    ) -> Self {
        ComposeEvaluator {
            flags,
            sync_probes,
            async_probes,
            cache,
            async_timeout,
        }
    }

    pub fn cache(&self) -> &MemoizationCache {
        &self.cache
    }

    /// Registered probes, sync stage first.
    pub fn probes(&self) -> impl Iterator<Item = &RegisteredProbe> {
        self.sync_probes.iter().chain(self.async_probes.iter())
    }

    /// Compute the verdict.
    pub async fn evaluate(&self) -> Verdict {
        let started = Instant::now();
        let baseline = self.flags.baseline();

        if let Some(flag) = baseline.first_missing() {
            info!(event = event_names::BASELINE_UNAVAILABLE, stage = %Stage::Baseline, flag = %flag, "baseline flag missing; skipping all probes");
            return self.finish(started, baseline, Decision::BaselineUnavailable { flag }, Vec::new());
        }

        let mut outcomes = Vec::with_capacity(self.sync_probes.len() + self.async_probes.len());

        debug!(event = event_names::STAGE_STARTED, stage = %Stage::SyncProbes, probes = self.sync_probes.len(), "sync stage started");
        for probe in &self.sync_probes {
            let passed = self.run_memoized(probe).await;
            outcomes.push(outcome(probe, passed));
            if !passed {
                info!(event = event_names::STAGE_SHORT_CIRCUIT, stage = %Stage::SyncProbes, probe = probe.name(), "sync probe negative; later probes skipped");
                let decision = Decision::SyncProbeNegative {
                    probe: probe.name().to_string(),
                };
                return self.finish(started, baseline, decision, outcomes);
            }
        }

        debug!(event = event_names::STAGE_STARTED, stage = %Stage::AsyncProbes, probes = self.async_probes.len(), "async stage started");
        // Every probe future exists and is polled by join_all before any result is inspected
        let launched: Vec<BoxFuture<'static, bool>> = self
            .async_probes
            .iter()
            .map(|probe| self.run_memoized(probe))
            .collect();
        let results = join_all(launched).await;

        let mut negative = Vec::new();
        for (probe, passed) in self.async_probes.iter().zip(results) {
            if !passed {
                negative.push(probe.name().to_string());
            }
            outcomes.push(outcome(probe, passed));
        }

        let decision = if negative.is_empty() {
            Decision::Supported
        } else {
            Decision::AsyncProbesNegative { probes: negative }
        };
        self.finish(started, baseline, decision, outcomes)
    }

    /// Memoized result of one probe, honoring the async stage timeout.
    pub fn run_memoized(&self, probe: &RegisteredProbe) -> BoxFuture<'static, bool> {
        let target = Arc::clone(&probe.probe);
        let timeout = match probe.stage {
            ProbeStage::Async => self.async_timeout,
            ProbeStage::Sync => None,
        };

        self.cache.get_or_run(probe.id, probe.name(), move || -> ProbeComputation {
            async move {
                let run = async {
                    target.test().await.map_err(|err| ProbeFailure::Errored {
                        message: err.to_string(),
                    })
                };
                // Checked on first poll, so where the token was requested does not matter
                match timeout {
                    Some(limit) if tokio::runtime::Handle::try_current().is_ok() => {
                        match tokio::time::timeout(limit, run).await {
                            Ok(result) => result,
                            Err(_) => Err(ProbeFailure::TimedOut {
                                after_ms: limit.as_millis() as u64,
                            }),
                        }
                    }
                    Some(_) => {
                        warn!(probe = target.name(), "no tokio runtime; async stage timeout not enforced");
                        run.await
                    }
                    None => run.await,
                }
            }
            .boxed()
        })
    }

    fn finish(
        &self,
        started: Instant,
        baseline: BaselineFlags,
        decision: Decision,
        probes: Vec<ProbeOutcome>,
    ) -> Verdict {
        let supported = decision == Decision::Supported;
        let verdict = Verdict {
            supported,
            decision,
            baseline,
            probes,
            decided_at: Utc::now().to_rfc3339(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            event = event_names::VERDICT_RESOLVED,
            supported = verdict.supported,
            probes_run = verdict.probes.len(),
            elapsed_ms = verdict.elapsed_ms,
            "verdict resolved"
        );
        verdict
    }
}

fn outcome(probe: &RegisteredProbe, passed: bool) -> ProbeOutcome {
    ProbeOutcome {
        id: probe.id,
        name: probe.name().to_string(),
        stage: probe.stage,
        passed,
    }
}
