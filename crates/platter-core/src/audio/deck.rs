//! Deck binding - ports, scratch and collaborators for one virtual turntable
//!
//! A deck couples two timecode capture ports with two playback ports and the
//! external collaborators that consume and produce its audio. The binding
//! owns no playback state itself; it only moves samples.

use jack::{AudioIn, AudioOut, Client, Port, ProcessScope};

use crate::types::{FixedSample, Sample, CHANNEL_TAGS, DEVICE_CHANNELS};

use super::config::OverflowPolicy;
use super::convert;
use super::error::{AudioError, AudioResult};

/// Consumer of one period of raw timecode samples
///
/// Implementations derive needle position and speed from the signal; the
/// bridge only delivers it. Called on the real-time thread, so
/// implementations must not block or allocate.
pub trait TimecodeDecoder: Send {
    /// Feed one period of interleaved fixed-point timecode samples
    fn submit(&mut self, pcm: &[FixedSample], nframes: usize, sample_rate: u32);
}

/// Producer of one period of mixed playback output
///
/// Called on the real-time thread, so implementations must not block or
/// allocate.
pub trait PlayerSource: Send {
    /// Fill `pcm` with `nframes` frames of interleaved fixed-point output
    fn collect(&mut self, pcm: &mut [FixedSample], nframes: usize, sample_rate: u32);
}

/// Name of a deck's timecode capture port for one channel
pub(crate) fn timecode_port_name(deck: &str, channel: char) -> String {
    format!("{}_timecode_{}", deck, channel)
}

/// Name of a deck's playback port for one channel
pub(crate) fn playback_port_name(deck: &str, channel: char) -> String {
    format!("{}_playback_{}", deck, channel)
}

/// Fixed-capacity, registration-ordered collection of decks
///
/// Insertion past capacity fails cleanly instead of disturbing what is
/// already registered. Decks are never removed; a cleared deck keeps its
/// slot.
pub(crate) struct Roster<T> {
    slots: Vec<T>,
    capacity: usize,
}

impl<T> Roster<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Checked insertion; the roster never grows past its capacity
    pub(crate) fn push(&mut self, item: T) -> AudioResult<()> {
        if self.slots.len() >= self.capacity {
            return Err(AudioError::DeckCapacity { max: self.capacity });
        }
        self.slots.push(item);
        Ok(())
    }

    pub(crate) fn has_space(&self) -> bool {
        self.slots.len() < self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.slots.iter_mut()
    }
}

/// The four JACK ports of one deck
pub(crate) struct DeckPorts {
    timecode: [Port<AudioIn>; DEVICE_CHANNELS],
    playback: [Port<AudioOut>; DEVICE_CHANNELS],
}

impl DeckPorts {
    /// Register a deck's ports against the client, per channel in the order
    /// timecode then playback
    ///
    /// A failure aborts the deck; ports created before the failure stay with
    /// the client (port lifetime is the client's).
    pub(crate) fn register(client: &Client, deck: &str) -> AudioResult<Self> {
        let capture = |channel: char| -> AudioResult<Port<AudioIn>> {
            let port = timecode_port_name(deck, channel);
            client
                .register_port(&port, AudioIn::default())
                .map_err(|e| AudioError::PortRegistration {
                    port,
                    reason: e.to_string(),
                })
        };
        let playback = |channel: char| -> AudioResult<Port<AudioOut>> {
            let port = playback_port_name(deck, channel);
            client
                .register_port(&port, AudioOut::default())
                .map_err(|e| AudioError::PortRegistration {
                    port,
                    reason: e.to_string(),
                })
        };

        let [left, right] = CHANNEL_TAGS;
        let timecode_left = capture(left)?;
        let playback_left = playback(left)?;
        let timecode_right = capture(right)?;
        let playback_right = playback(right)?;

        Ok(Self {
            timecode: [timecode_left, timecode_right],
            playback: [playback_left, playback_right],
        })
    }

    /// Borrow this period's buffers: timecode inputs and playback outputs
    pub(crate) fn period_slices<'a>(
        &'a mut self,
        ps: &'a ProcessScope,
    ) -> ([&'a [Sample]; DEVICE_CHANNELS], [&'a mut [Sample]; DEVICE_CHANNELS]) {
        let input = [self.timecode[0].as_slice(ps), self.timecode[1].as_slice(ps)];
        let [left, right] = &mut self.playback;
        let output = [left.as_mut_slice(ps), right.as_mut_slice(ps)];
        (input, output)
    }
}

/// The conversion and collaborator state of one deck
///
/// Owned by the session while configured, then by the dispatcher once the
/// client is active; only ever touched by one thread at a time.
pub(crate) struct DeckState {
    name: String,
    scratch: Vec<FixedSample>,
    overflow: OverflowPolicy,
    timecoder: Option<Box<dyn TimecodeDecoder>>,
    player: Box<dyn PlayerSource>,
    cleared: bool,
}

impl DeckState {
    pub(crate) fn new(
        name: &str,
        max_period_frames: usize,
        overflow: OverflowPolicy,
        timecoder: Option<Box<dyn TimecodeDecoder>>,
        player: Box<dyn PlayerSource>,
    ) -> AudioResult<Self> {
        let samples = max_period_frames * DEVICE_CHANNELS;
        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(samples)
            .map_err(|e| AudioError::Allocation(e.to_string()))?;
        scratch.resize(samples, 0);

        Ok(Self {
            name: name.to_string(),
            scratch,
            overflow,
            timecoder,
            player,
            cleared: false,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Drop the conversion scratch. The deck keeps its roster slot and its
    /// ports but is skipped by the dispatcher from here on.
    pub(crate) fn clear(&mut self) {
        self.scratch = Vec::new();
        self.cleared = true;
    }

    /// Move one period of audio through the deck: timecode input to the
    /// decoder, player output to the playback ports, both via the interleaved
    /// scratch buffer.
    pub(crate) fn run_period(
        &mut self,
        input: [&[Sample]; DEVICE_CHANNELS],
        output: [&mut [Sample]; DEVICE_CHANNELS],
        nframes: usize,
        sample_rate: u32,
    ) {
        let pcm = &mut self.scratch[..nframes * DEVICE_CHANNELS];

        // Timecode input
        convert::interleave(pcm, input, nframes, self.overflow);
        if let Some(timecoder) = self.timecoder.as_deref_mut() {
            timecoder.submit(pcm, nframes, sample_rate);
        }

        // Audio output; the player overwrites the consumed timecode samples
        self.player.collect(pcm, nframes, sample_rate);
        convert::deinterleave(output, pcm, nframes);
    }
}

/// One registered deck: its JACK ports plus its processing state
pub(crate) struct DeckContext {
    pub(crate) ports: DeckPorts,
    pub(crate) state: DeckState,
}

impl DeckContext {
    /// Process one period for this deck; cleared decks are skipped
    pub(crate) fn run_period(&mut self, ps: &ProcessScope, nframes: usize, sample_rate: u32) {
        if self.state.is_cleared() {
            return;
        }
        let (input, output) = self.ports.period_slices(ps);
        self.state.run_period(input, output, nframes, sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_port_naming_contract() {
        assert_eq!(timecode_port_name("deckA", 'L'), "deckA_timecode_L");
        assert_eq!(timecode_port_name("deckA", 'R'), "deckA_timecode_R");
        assert_eq!(playback_port_name("deckA", 'L'), "deckA_playback_L");
        assert_eq!(playback_port_name("deckA", 'R'), "deckA_playback_R");
    }

    #[test]
    fn test_roster_rejects_decks_past_capacity() {
        let mut roster = Roster::with_capacity(2);
        roster.push("a").unwrap();
        roster.push("b").unwrap();

        match roster.push("c") {
            Err(AudioError::DeckCapacity { max }) => assert_eq!(max, 2),
            other => panic!("expected DeckCapacity, got {:?}", other),
        }

        // Decks registered before the failed insertion are untouched
        assert_eq!(roster.len(), 2);
        assert_eq!(*roster.get_mut(0).unwrap(), "a");
        assert_eq!(*roster.get_mut(1).unwrap(), "b");
    }

    struct RecordingDecoder {
        label: String,
        journal: Arc<Mutex<Vec<String>>>,
        seen: Arc<Mutex<Vec<i16>>>,
    }

    impl TimecodeDecoder for RecordingDecoder {
        fn submit(&mut self, pcm: &[i16], nframes: usize, sample_rate: u32) {
            assert_eq!(sample_rate, 48_000);
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:submit", self.label));
            *self.seen.lock().unwrap() = pcm[..nframes * DEVICE_CHANNELS].to_vec();
        }
    }

    struct ConstantPlayer {
        label: String,
        journal: Arc<Mutex<Vec<String>>>,
        value: i16,
    }

    impl PlayerSource for ConstantPlayer {
        fn collect(&mut self, pcm: &mut [i16], nframes: usize, _sample_rate: u32) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:collect", self.label));
            pcm[..nframes * DEVICE_CHANNELS].fill(self.value);
        }
    }

    #[test]
    fn test_deck_moves_timecode_in_and_playback_out() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut deck = DeckState::new(
            "A",
            64,
            OverflowPolicy::Wrap,
            Some(Box::new(RecordingDecoder {
                label: "A".into(),
                journal: journal.clone(),
                seen: seen.clone(),
            })),
            Box::new(ConstantPlayer {
                label: "A".into(),
                journal: journal.clone(),
                value: 8192,
            }),
        )
        .unwrap();

        let left = [0.5f32; 4];
        let right = [-0.5f32; 4];
        let mut out_left = [0.0f32; 4];
        let mut out_right = [0.0f32; 4];
        deck.run_period(
            [&left[..], &right[..]],
            [&mut out_left[..], &mut out_right[..]],
            4,
            48_000,
        );

        // The decoder saw the interleaved timecode input
        let expected: Vec<i16> = [16384i16, -16384].repeat(4);
        assert_eq!(*seen.lock().unwrap(), expected);

        // The decoder consumed the scratch before the player overwrote it
        assert_eq!(*journal.lock().unwrap(), vec!["A:submit", "A:collect"]);

        // Both playback channels carry the player's output (8192 / 32768)
        assert!(out_left.iter().chain(out_right.iter()).all(|&v| v == 0.25));
    }

    #[test]
    fn test_decks_without_decoder_still_play() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut deck = DeckState::new(
            "solo",
            16,
            OverflowPolicy::Wrap,
            None,
            Box::new(ConstantPlayer {
                label: "solo".into(),
                journal: journal.clone(),
                value: -8192,
            }),
        )
        .unwrap();

        let silence = [0.0f32; 8];
        let mut out_left = [0.0f32; 8];
        let mut out_right = [0.0f32; 8];
        deck.run_period(
            [&silence[..], &silence[..]],
            [&mut out_left[..], &mut out_right[..]],
            8,
            48_000,
        );

        assert_eq!(*journal.lock().unwrap(), vec!["solo:collect"]);
        assert!(out_left.iter().all(|&v| v == -0.25));
    }

    #[test]
    fn test_clear_releases_the_scratch() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut deck = DeckState::new(
            "done",
            64,
            OverflowPolicy::Wrap,
            None,
            Box::new(ConstantPlayer {
                label: "done".into(),
                journal,
                value: 0,
            }),
        )
        .unwrap();

        assert!(!deck.is_cleared());
        deck.clear();
        assert!(deck.is_cleared());
        assert_eq!(deck.scratch.capacity(), 0);
    }
}
