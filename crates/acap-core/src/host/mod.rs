//! Contract of the audio host the probes exercise.
//!
//! The host is the facade over the native audio implementation. Probes only
//! need a narrow slice of it: constructing and closing contexts, decoding
//! audio data, and rendering a channel-merger graph.

mod reference;

pub use reference::ReferenceHost;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by an audio host, mirroring the exception kinds a native
/// implementation distinguishes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("context is closed")]
    Closed,
}

/// Latency category requested when creating a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyHint {
    Interactive,
    Balanced,
    Playback,
}

/// Options for realtime context construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextOptions {
    pub latency_hint: Option<LatencyHint>,
    pub sample_rate: Option<f32>,
}

impl ContextOptions {
    /// Whether any option is set.
    pub fn is_empty(&self) -> bool {
        self.latency_hint.is_none() && self.sample_rate.is_none()
    }
}

/// Decoded PCM audio, one vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: f32,
    pub channels: Vec<Vec<f32>>,
}

/// A native audio implementation.
pub trait AudioHost: Send + Sync {
    /// Human-readable host name for reports.
    fn name(&self) -> &str;

    /// Construct a realtime context.
    fn create_context(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn AudioContextHandle>, HostError>;

    /// Construct an offline (render-to-buffer) context.
    fn create_offline_context(
        &self,
        channels: u32,
        length: usize,
        sample_rate: f32,
    ) -> Result<Box<dyn AudioContextHandle>, HostError>;
}

/// A live context. Dropping a handle without closing it leaks the native
/// resource on real hosts, so probes always close what they open.
pub trait AudioContextHandle: Send {
    /// Release the context.
    fn close(self: Box<Self>) -> Result<(), HostError>;

    /// Decode an encoded audio file.
    fn decode_audio_data(&self, data: Vec<u8>) -> BoxFuture<'static, Result<DecodedAudio, HostError>>;

    /// Render a one-sample mono impulse of `1.0` connected to input 0 of a
    /// two-input channel merger and return the merger's output channels.
    fn render_merged_impulse(&self) -> BoxFuture<'static, Result<Vec<Vec<f32>>, HostError>>;
}
