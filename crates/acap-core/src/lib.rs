//! Audio Capability Probe Core Library
//!
//! This library decides, once per process, whether an audio host is usable:
//! - Probes and the memoization cache that runs each at most once
//! - Staged evaluation (baseline flags, sync probes, async probes)
//! - The shared, lazily started capability token
//! - Concrete audio probes and a software reference host
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod cache;
pub mod engine;
pub mod evaluator;
pub mod exit_codes;
pub mod host;
pub mod logging;
pub mod observer;
pub mod probe;
pub mod probes;
pub mod token;
pub mod wiring;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheStats, EntryState, MemoizationCache};
pub use engine::{Engine, EngineBuilder};
pub use evaluator::{ComposeEvaluator, Decision, ProbeOutcome, Verdict};
pub use observer::{FailureObserver, TracingObserver};
pub use probe::{FnProbe, Probe, ProbeDescriptor, ProbeError, ProbeResult, RegisteredProbe};
pub use token::{CapabilityToken, TokenState};
pub use wiring::{standard_engine, OverriddenFlags};
