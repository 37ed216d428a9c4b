//! Common types for the Platter audio bridge
//!
//! These are the fundamental sample types shared by the converter, the deck
//! bindings and the external collaborators (timecode decoders and players).

/// Number of audio channels per deck direction (stereo)
pub const DEVICE_CHANNELS: usize = 2;

/// Channel letters used in port names, in channel order (0 = L, 1 = R)
pub const CHANNEL_TAGS: [char; DEVICE_CHANNELS] = ['L', 'R'];

/// Floating-point sample as exchanged with JACK (nominal range [-1.0, 1.0))
pub type Sample = f32;

/// Fixed-point sample as consumed by timecode decoders and players
pub type FixedSample = i16;

/// Scale factor between [`Sample`] and [`FixedSample`]
///
/// One quantization step is `1.0 / 32768.0`; full negative scale (-1.0) maps
/// exactly to `i16::MIN`.
pub const FIXED_SCALE: f32 = 32768.0;
