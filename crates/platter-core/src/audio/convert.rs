//! Fixed-point sample conversion
//!
//! JACK exchanges audio as one `f32` buffer per channel; timecode decoders
//! and players consume a single interleaved 16-bit buffer. The two functions
//! here translate between the representations in a single pass with no
//! allocation, so they are safe to call from the process callback.

use crate::types::{FixedSample, Sample, DEVICE_CHANNELS, FIXED_SCALE};

use super::config::OverflowPolicy;

/// Convert one floating-point sample to fixed point under the given policy
#[inline]
fn to_fixed(sample: Sample, policy: OverflowPolicy) -> FixedSample {
    let scaled = (sample * FIXED_SCALE).round();
    match policy {
        // i64 holds every scaled f32 exactly; the narrowing cast then wraps
        // on the 16-bit width
        OverflowPolicy::Wrap => scaled as i64 as FixedSample,
        OverflowPolicy::Clamp => {
            scaled.clamp(FixedSample::MIN as Sample, FixedSample::MAX as Sample) as FixedSample
        }
    }
}

/// Interleave per-channel JACK buffers into a fixed-point buffer
///
/// Writes `nframes * DEVICE_CHANNELS` samples to `dst`, channel L first
/// within each frame, each scaled by [`FIXED_SCALE`] and rounded to nearest.
pub fn interleave(
    dst: &mut [FixedSample],
    channels: [&[Sample]; DEVICE_CHANNELS],
    nframes: usize,
    policy: OverflowPolicy,
) {
    assert!(dst.len() >= nframes * DEVICE_CHANNELS);
    let [left, right] = channels;
    assert!(left.len() >= nframes && right.len() >= nframes);

    for (i, frame) in dst.chunks_exact_mut(DEVICE_CHANNELS).take(nframes).enumerate() {
        frame[0] = to_fixed(left[i], policy);
        frame[1] = to_fixed(right[i], policy);
    }
}

/// Deinterleave a fixed-point buffer into per-channel JACK buffers
///
/// The inverse of [`interleave`] up to one quantization step (1/32768).
pub fn deinterleave(
    channels: [&mut [Sample]; DEVICE_CHANNELS],
    src: &[FixedSample],
    nframes: usize,
) {
    assert!(src.len() >= nframes * DEVICE_CHANNELS);
    let [left, right] = channels;
    assert!(left.len() >= nframes && right.len() >= nframes);

    for (i, frame) in src.chunks_exact(DEVICE_CHANNELS).take(nframes).enumerate() {
        left[i] = frame[0] as Sample / FIXED_SCALE;
        right[i] = frame[1] as Sample / FIXED_SCALE;
    }
}
