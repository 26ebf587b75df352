//! Memoization of probe results.
//!
//! Each probe identity is computed at most once for the lifetime of the
//! cache. Concurrent requests made before the first computation settles
//! share its pending future. Failures (errors, panics, timeouts) resolve to
//! `false` and are forwarded to the observer; they never reach the caller.

use crate::logging::event_names;
use crate::observer::FailureObserver;
use acap_common::{ProbeFailure, ProbeId};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

type SharedOutcome = Shared<BoxFuture<'static, bool>>;
type Entries = Mutex<HashMap<ProbeId, CacheEntry>>;

/// A computation producing a probe outcome.
pub type ProbeComputation = BoxFuture<'static, Result<bool, ProbeFailure>>;

enum CacheEntry {
    Resolved(bool),
    Pending(SharedOutcome),
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Resolved(bool),
}

/// Execution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Computations actually invoked.
    pub executions: usize,
    /// Requests served from a resolved or pending entry.
    pub hits: usize,
}

/// Identity-keyed, single-execution cache of probe outcomes.
///
/// Cloning yields a handle to the same entries.
#[derive(Clone)]
pub struct MemoizationCache {
    entries: Arc<Entries>,
    observer: Option<Arc<dyn FailureObserver>>,
    executions: Arc<AtomicUsize>,
    hits: Arc<AtomicUsize>,
}

impl MemoizationCache {
    pub fn new(observer: Option<Arc<dyn FailureObserver>>) -> Self {
        MemoizationCache {
            entries: Arc::new(Mutex::new(HashMap::new())),
            observer,
            executions: Arc::new(AtomicUsize::new(0)),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return the memoized outcome for `id`, running `computation` only if
    /// nothing is cached or in flight.
    ///
    /// The pending entry is registered before `computation` is invoked. The
    /// computation itself starts when the returned future is first polled.
    pub fn get_or_run<F>(&self, id: ProbeId, name: &str, computation: F) -> BoxFuture<'static, bool>
    where
        F: FnOnce() -> ProbeComputation + Send + 'static,
    {
        let mut entries = lock(&self.entries);
        match entries.get(&id) {
            Some(CacheEntry::Resolved(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(event = event_names::PROBE_CACHE_HIT, probe = name, value = *value, "resolved entry reused");
                return future::ready(*value).boxed();
            }
            Some(CacheEntry::Pending(pending)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(event = event_names::PROBE_CACHE_HIT, probe = name, "pending entry shared");
                return pending.clone().boxed();
            }
            None => {}
        }

        let pending = self.execute(id, name.to_string(), computation).boxed().shared();
        entries.insert(id, CacheEntry::Pending(pending.clone()));
        pending.boxed()
    }

    /// State of an entry, if one exists.
    pub fn state(&self, id: ProbeId) -> Option<EntryState> {
        lock(&self.entries).get(&id).map(|entry| match entry {
            CacheEntry::Resolved(value) => EntryState::Resolved(*value),
            CacheEntry::Pending(_) => EntryState::Pending,
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            executions: self.executions.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    fn execute<F>(&self, id: ProbeId, name: String, computation: F) -> impl std::future::Future<Output = bool> + Send + 'static
    where
        F: FnOnce() -> ProbeComputation + Send + 'static,
    {
        // Weak so a pending entry does not keep its own map alive
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        let observer = self.observer.clone();
        let executions = Arc::clone(&self.executions);

        async move {
            executions.fetch_add(1, Ordering::Relaxed);
            debug!(event = event_names::PROBE_STARTED, probe_id = %id, probe = %name, "probe started");

            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(computation)) {
                Ok(running) => AssertUnwindSafe(running)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(ProbeFailure::from_panic(payload.as_ref()))),
                Err(payload) => Err(ProbeFailure::from_panic(payload.as_ref())),
            };

            let value = match outcome {
                Ok(value) => value,
                Err(failure) => {
                    debug!(event = event_names::PROBE_FAILED, probe_id = %id, probe = %name, error = %failure, "probe failure absorbed");
                    if let Some(observer) = &observer {
                        observer.probe_failed(id, &name, &failure);
                    }
                    false
                }
            };

            if let Some(entries) = entries.upgrade() {
                lock(&entries).insert(id, CacheEntry::Resolved(value));
            }
            debug!(event = event_names::PROBE_RESOLVED, probe_id = %id, probe = %name, passed = value, "probe resolved");
            value
        }
    }
}

impl std::fmt::Debug for MemoizationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizationCache")
            .field("entries", &lock(&self.entries).len())
            .field("stats", &self.stats())
            .finish()
    }
}

// Entries are only ever replaced whole, so a poisoned map is still consistent.
fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<ProbeId, CacheEntry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
