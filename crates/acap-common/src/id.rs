//! Probe identity types.
//!
//! A probe is identified by an opaque handle assigned when it is registered
//! with an engine, never by its human-readable name. Two unrelated probes that
//! happen to share a name still get distinct identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, collision-free probe identity.
///
/// Handles are dense indices handed out in registration order by the engine
/// builder; they are only meaningful inside the engine that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(u32);

impl ProbeId {
    /// Create an identity from a registration index.
    pub fn from_index(index: u32) -> Self {
        ProbeId(index)
    }

    /// Registration index backing this identity.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe#{}", self.0)
    }
}

/// Evaluation stage a probe is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStage {
    /// Cheap checks run one by one in declared order, stopping at the first failure.
    Sync,
    /// Expensive checks launched together once every sync probe passed.
    Async,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStage::Sync => write!(f, "sync"),
            ProbeStage::Async => write!(f, "async"),
        }
    }
}
