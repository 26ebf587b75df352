//! Probe abstraction.
//!
//! A probe tests one capability and resolves to a boolean. Every probe is
//! asynchronous at the type level; checks that complete synchronously simply
//! resolve on first poll.

use crate::host::HostError;
use acap_common::{ProbeId, ProbeStage};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors a probe may return instead of a verdict.
///
/// The engine downgrades these to a negative result; they never reach the
/// verdict consumer.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("audio host error: {0}")]
    Host(#[from] HostError),

    #[error("{0}")]
    Failed(String),
}

/// Outcome of a single probe run.
pub type ProbeResult = Result<bool, ProbeError>;

/// A named capability check.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable, human-readable name (used in logs and configuration).
    fn name(&self) -> &str;

    /// Run the check. May construct and discard transient resources.
    async fn test(&self) -> ProbeResult;
}

/// Adapter turning a synchronous closure into a [`Probe`].
pub struct FnProbe<F> {
    name: String,
    check: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        FnProbe {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> Probe for FnProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn test(&self) -> ProbeResult {
        (self.check)()
    }
}

/// A probe bound to the identity and stage assigned at registration.
#[derive(Clone)]
pub struct RegisteredProbe {
    pub id: ProbeId,
    pub stage: ProbeStage,
    pub probe: Arc<dyn Probe>,
}

impl RegisteredProbe {
    pub fn name(&self) -> &str {
        self.probe.name()
    }

    pub fn descriptor(&self) -> ProbeDescriptor {
        ProbeDescriptor {
            id: self.id,
            name: self.name().to_string(),
            stage: self.stage,
        }
    }
}

impl std::fmt::Debug for RegisteredProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProbe")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("stage", &self.stage)
            .finish()
    }
}

/// Serializable description of a registered probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeDescriptor {
    pub id: ProbeId,
    pub name: String,
    pub stage: ProbeStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_probe_resolves_immediately() {
        let probe = FnProbe::new("always", || Ok(true));
        assert_eq!(probe.name(), "always");
        assert!(probe.test().await.unwrap());
    }

    #[tokio::test]
    async fn test_fn_probe_propagates_errors() {
        let probe = FnProbe::new("broken", || Err(HostError::Closed.into()));
        let err = probe.test().await.unwrap_err();
        assert!(matches!(err, ProbeError::Host(HostError::Closed)));
    }

    #[test]
    fn test_descriptor_serializes() {
        let registered = RegisteredProbe {
            id: ProbeId::from_index(2),
            stage: ProbeStage::Async,
            probe: Arc::new(FnProbe::new("merging", || Ok(true))),
        };
        let json = serde_json::to_value(registered.descriptor()).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["name"], "merging");
        assert_eq!(json["stage"], "async");
    }
}
