//! Pure-software reference host.
//!
//! Implements the host contract correctly and can emulate individual defects
//! so the engine can be exercised end to end without a native backend.

use super::{AudioContextHandle, AudioHost, ContextOptions, DecodedAudio, HostError};
use acap_config::HostDefect;
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Canonical PCM WAV header length.
const WAV_HEADER_LEN: usize = 44;

/// Software host with optional emulated defects.
#[derive(Debug, Default)]
pub struct ReferenceHost {
    defects: Arc<HashSet<HostDefect>>,
    open_contexts: Arc<AtomicUsize>,
}

impl ReferenceHost {
    /// A host without defects.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host emulating the given defects.
    pub fn with_defects(defects: impl IntoIterator<Item = HostDefect>) -> Self {
        ReferenceHost {
            defects: Arc::new(defects.into_iter().collect()),
            open_contexts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of contexts created and not successfully closed.
    pub fn open_contexts(&self) -> usize {
        self.open_contexts.load(Ordering::SeqCst)
    }

    fn has(&self, defect: HostDefect) -> bool {
        self.defects.contains(&defect)
    }

    fn open(&self, channels: u32) -> Box<dyn AudioContextHandle> {
        self.open_contexts.fetch_add(1, Ordering::SeqCst);
        Box::new(ReferenceContext {
            channels,
            defects: Arc::clone(&self.defects),
            open_contexts: Arc::clone(&self.open_contexts),
        })
    }
}

impl AudioHost for ReferenceHost {
    fn name(&self) -> &str {
        "reference"
    }

    fn create_context(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn AudioContextHandle>, HostError> {
        if !options.is_empty() && self.has(HostDefect::RejectsContextOptions) {
            return Err(HostError::NotSupported(
                "context options are not accepted".to_string(),
            ));
        }
        check_sample_rate(options.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE))?;
        Ok(self.open(2))
    }

    fn create_offline_context(
        &self,
        channels: u32,
        length: usize,
        sample_rate: f32,
    ) -> Result<Box<dyn AudioContextHandle>, HostError> {
        if channels == 0 || length == 0 {
            return Err(HostError::NotSupported(
                "offline context needs at least one channel and one frame".to_string(),
            ));
        }
        check_sample_rate(sample_rate)?;
        Ok(self.open(channels))
    }
}

fn check_sample_rate(sample_rate: f32) -> Result<(), HostError> {
    if (3_000.0..=768_000.0).contains(&sample_rate) {
        Ok(())
    } else {
        Err(HostError::NotSupported(format!(
            "sample rate {} out of range",
            sample_rate
        )))
    }
}

struct ReferenceContext {
    channels: u32,
    defects: Arc<HashSet<HostDefect>>,
    open_contexts: Arc<AtomicUsize>,
}

impl AudioContextHandle for ReferenceContext {
    fn close(self: Box<Self>) -> Result<(), HostError> {
        if self.defects.contains(&HostDefect::CloseUnsupported) {
            return Err(HostError::NotSupported("close".to_string()));
        }
        self.open_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn decode_audio_data(&self, data: Vec<u8>) -> BoxFuture<'static, Result<DecodedAudio, HostError>> {
        if self.defects.contains(&HostDefect::DecodeNeverSettles) {
            return future::pending().boxed();
        }
        let wrong_error_kind = self.defects.contains(&HostDefect::DecodeErrorNotTypeError);
        future::ready(decode_wav(&data, wrong_error_kind)).boxed()
    }

    fn render_merged_impulse(&self) -> BoxFuture<'static, Result<Vec<Vec<f32>>, HostError>> {
        if self.channels < 2 {
            return future::ready(Err(HostError::InvalidState(
                "merger output needs two channels".to_string(),
            )))
            .boxed();
        }
        let mut output = vec![vec![0.0_f32]; 2];
        if !self.defects.contains(&HostDefect::MergerDropsInput) {
            output[0][0] = 1.0;
        }
        future::ready(Ok(output)).boxed()
    }
}

/// Decode a canonical 16-bit PCM WAV file.
fn decode_wav(data: &[u8], wrong_error_kind: bool) -> Result<DecodedAudio, HostError> {
    if data.is_empty() {
        return Err(if wrong_error_kind {
            HostError::Encoding("unable to decode audio data".to_string())
        } else {
            HostError::TypeError("audio data must not be empty".to_string())
        });
    }
    if data.len() < WAV_HEADER_LEN || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(HostError::Encoding("unrecognized container".to_string()));
    }

    let read_u16 = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);
    let read_u32 = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

    let channels = read_u16(22) as usize;
    let sample_rate = read_u32(24);
    let bits = read_u16(34);
    if channels == 0 || bits != 16 || &data[36..40] != b"data" {
        return Err(HostError::Encoding("unsupported PCM layout".to_string()));
    }

    let payload_len = (read_u32(40) as usize).min(data.len() - WAV_HEADER_LEN);
    let payload = &data[WAV_HEADER_LEN..WAV_HEADER_LEN + payload_len];
    let mut decoded = vec![Vec::new(); channels];
    for (idx, frame) in payload.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([frame[0], frame[1]]);
        decoded[idx % channels].push(f32::from(sample) / 32_768.0);
    }

    Ok(DecodedAudio {
        sample_rate: sample_rate as f32,
        channels: decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LatencyHint;

    fn wav(channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&22_050u32.to_le_bytes());
        out.extend_from_slice(&(22_050u32 * 2 * u32::from(channels)).to_le_bytes());
        out.extend_from_slice(&(2 * channels).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_valid_stereo_wav() {
        let decoded = decode_wav(&wav(2, &[16_384, -16_384, 0, 32_767]), false).unwrap();
        assert_eq!(decoded.sample_rate, 22_050.0);
        assert_eq!(decoded.channels.len(), 2);
        assert_eq!(decoded.channels[0], vec![0.5, 0.0]);
        assert_eq!(decoded.channels[1][0], -0.5);
    }

    #[test]
    fn test_decode_empty_is_type_error() {
        assert!(matches!(decode_wav(&[], false), Err(HostError::TypeError(_))));
        assert!(matches!(decode_wav(&[], true), Err(HostError::Encoding(_))));
    }

    #[test]
    fn test_decode_garbage_is_encoding_error() {
        assert!(matches!(
            decode_wav(b"definitely not audio data at all, but long enough to parse", false),
            Err(HostError::Encoding(_))
        ));
    }

    #[test]
    fn test_contexts_are_tracked_until_closed() {
        let host = ReferenceHost::new();
        let ctx = host.create_context(&ContextOptions::default()).unwrap();
        assert_eq!(host.open_contexts(), 1);
        ctx.close().unwrap();
        assert_eq!(host.open_contexts(), 0);
    }

    #[test]
    fn test_close_unsupported_defect_leaks_context() {
        let host = ReferenceHost::with_defects([HostDefect::CloseUnsupported]);
        let ctx = host.create_context(&ContextOptions::default()).unwrap();
        assert!(matches!(ctx.close(), Err(HostError::NotSupported(_))));
        assert_eq!(host.open_contexts(), 1);
    }

    #[test]
    fn test_rejects_options_only_when_defective() {
        let options = ContextOptions {
            latency_hint: Some(LatencyHint::Balanced),
            sample_rate: None,
        };
        assert!(ReferenceHost::new().create_context(&options).is_ok());
        let defective = ReferenceHost::with_defects([HostDefect::RejectsContextOptions]);
        assert!(defective.create_context(&options).is_err());
        assert!(defective.create_context(&ContextOptions::default()).is_ok());
    }

    #[test]
    fn test_merged_impulse_lands_on_first_channel() {
        let host = ReferenceHost::new();
        let ctx = host.create_offline_context(2, 1, 44_100.0).unwrap();
        let output = futures::executor::block_on(ctx.render_merged_impulse()).unwrap();
        assert_eq!(output, vec![vec![1.0], vec![0.0]]);

        let mono = host.create_offline_context(1, 1, 44_100.0).unwrap();
        assert!(futures::executor::block_on(mono.render_merged_impulse()).is_err());
    }

    #[test]
    fn test_sample_rate_range_applies_to_both_context_kinds() {
        let host = ReferenceHost::new();
        let options = ContextOptions {
            latency_hint: None,
            sample_rate: Some(1_000.0),
        };
        assert!(matches!(host.create_context(&options), Err(HostError::NotSupported(_))));
        assert!(host.create_offline_context(1, 1, 1_000_000.0).is_err());
        assert_eq!(host.open_contexts(), 0);
    }
}
