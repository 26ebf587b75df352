//! Standard engine wiring from an [`EngineConfig`].

use crate::engine::{Engine, EngineBuilder};
use crate::host::AudioHost;
use crate::observer::TracingObserver;
use crate::probes::{names, CloseProbe, ContextOptionsProbe, DecodeErrorProbe, MergingProbe};
use crate::probe::Probe;
use acap_common::{BaselineFlags, Error, FeatureFlagSource, ProbeStage, Result};
use acap_config::{BaselineOverrides, EngineConfig};
use std::sync::Arc;
use tracing::debug;

/// Baseline flags with configuration overrides applied.
pub struct OverriddenFlags {
    detected: Arc<dyn FeatureFlagSource>,
    overrides: BaselineOverrides,
}

impl OverriddenFlags {
    pub fn new(detected: Arc<dyn FeatureFlagSource>, overrides: BaselineOverrides) -> Self {
        OverriddenFlags {
            detected,
            overrides,
        }
    }
}

impl FeatureFlagSource for OverriddenFlags {
    fn baseline(&self) -> BaselineFlags {
        self.overrides.apply(self.detected.baseline())
    }
}

/// Build an engine running the four standard probes against `host`.
///
/// Sync stage: `context_options`, `close`. Async stage: `decode_error_type`,
/// `merging`. Probes listed in `disabled_probes` are not registered.
pub fn standard_engine(
    host: Arc<dyn AudioHost>,
    flags: Arc<dyn FeatureFlagSource>,
    config: &EngineConfig,
) -> Result<Engine> {
    if let Some(unknown) = config
        .disabled_probes
        .iter()
        .find(|name| !names::ALL.contains(&name.as_str()))
    {
        return Err(Error::UnknownProbe {
            name: unknown.clone(),
        });
    }

    let flags = OverriddenFlags::new(flags, config.baseline_overrides);
    let mut builder = EngineBuilder::new(Arc::new(flags))
        .async_stage_timeout(config.async_stage_timeout());
    if config.report_probe_failures {
        builder = builder.observer(Arc::new(TracingObserver));
    }

    let standard: [(ProbeStage, Arc<dyn Probe>); 4] = [
        (ProbeStage::Sync, Arc::new(ContextOptionsProbe::new(Arc::clone(&host)))),
        (ProbeStage::Sync, Arc::new(CloseProbe::new(Arc::clone(&host)))),
        (ProbeStage::Async, Arc::new(DecodeErrorProbe::new(Arc::clone(&host)))),
        (ProbeStage::Async, Arc::new(MergingProbe::new(host))),
    ];
    for (stage, probe) in standard {
        if config.is_disabled(probe.name()) {
            debug!(probe = probe.name(), "probe disabled by configuration");
            continue;
        }
        builder.register(stage, probe);
    }

    Ok(builder.build())
}
