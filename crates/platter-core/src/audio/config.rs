//! Session configuration
//!
//! Defines the fixed parameters of an audio session: the client name, the
//! roster capacity, the scratch bound the dispatcher is sized for, and the
//! fixed-point conversion policy.

use serde::{Deserialize, Serialize};

/// Default JACK client name
pub const DEFAULT_CLIENT_NAME: &str = "platter";

/// Default number of deck slots in the roster
pub const DEFAULT_MAX_DECKS: usize = 4;

/// Default per-deck scratch capacity in frames
///
/// JACK servers commonly run periods of 64-1024 frames; raise this in the
/// config when the server is tuned for larger periods. The session refuses to
/// connect to a server whose period exceeds this bound.
pub const DEFAULT_MAX_PERIOD_FRAMES: usize = 1024;

/// Behaviour of fixed-point conversion for samples outside [-1.0, 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Let out-of-range values wrap on the 16-bit width (1.0 becomes -32768)
    ///
    /// This is the historical contract of the bridge: timecode decoders were
    /// written against unclamped conversion, and bit-level round trips depend
    /// on it.
    #[default]
    Wrap,

    /// Saturate out-of-range values at the 16-bit limits
    Clamp,
}

/// Configuration for an audio session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JACK client name (the server may rename on collision)
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Capacity of the deck roster
    #[serde(default = "default_max_decks")]
    pub max_decks: usize,

    /// Largest period, in frames, the dispatcher is prepared to handle
    #[serde(default = "default_max_period_frames")]
    pub max_period_frames: usize,

    /// Fixed-point conversion policy for out-of-range samples
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_max_decks() -> usize {
    DEFAULT_MAX_DECKS
}

fn default_max_period_frames() -> usize {
    DEFAULT_MAX_PERIOD_FRAMES
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            max_decks: DEFAULT_MAX_DECKS,
            max_period_frames: DEFAULT_MAX_PERIOD_FRAMES,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Set the JACK client name
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the roster capacity
    pub fn with_max_decks(mut self, decks: usize) -> Self {
        self.max_decks = decks;
        self
    }

    /// Set the largest period the dispatcher will accept
    pub fn with_max_period_frames(mut self, frames: usize) -> Self {
        self.max_period_frames = frames;
        self
    }

    /// Use saturating fixed-point conversion instead of the wrapping default
    pub fn with_clamped_conversion(mut self) -> Self {
        self.overflow = OverflowPolicy::Clamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_bridge_contract() {
        let config = SessionConfig::default();
        assert_eq!(config.client_name, "platter");
        assert_eq!(config.max_decks, 4);
        assert_eq!(config.max_period_frames, 1024);
        assert_eq!(config.overflow, OverflowPolicy::Wrap);
    }
}
