//! Real-time process dispatch
//!
//! One process callback serves every registered deck. Decks are visited in
//! registration order, each independently of the others; no failure of one
//! deck is allowed to silence the rest, and nothing on this path may block
//! or allocate.

use jack::{Client, Control, ProcessScope};

use super::deck::{DeckContext, Roster};

/// The periodic callback state: the roster and the fixed session parameters
///
/// Built once at activation from the session's roster; after that only the
/// JACK real-time thread touches it.
pub(crate) struct Dispatcher {
    decks: Roster<DeckContext>,
    sample_rate: u32,
    max_period_frames: usize,
}

impl Dispatcher {
    pub(crate) fn new(decks: Roster<DeckContext>, sample_rate: u32, max_period_frames: usize) -> Self {
        Self {
            decks,
            sample_rate,
            max_period_frames,
        }
    }
}

impl jack::ProcessHandler for Dispatcher {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        let nframes = ps.n_frames() as usize;

        // The server period was checked at connect time; a larger request
        // here means the external contract is broken, not a local failure
        assert!(
            nframes <= self.max_period_frames,
            "JACK requested {} frames, configured maximum is {}",
            nframes,
            self.max_period_frames
        );

        for deck in self.decks.iter_mut() {
            deck.run_period(ps, nframes, self.sample_rate);
        }

        Control::Continue
    }
}

/// Notification handler for server-side events
pub(crate) struct Notifications;

impl jack::NotificationHandler for Notifications {
    fn sample_rate(&mut self, _: &Client, srate: jack::Frames) -> Control {
        // The session rate is fixed at connect time; decoders and players
        // keep receiving the original rate if the server changes its mind
        log::warn!("JACK sample rate changed to {}Hz mid-session", srate);
        Control::Continue
    }

    fn xrun(&mut self, _: &Client) -> Control {
        log::warn!("JACK xrun detected");
        Control::Continue
    }

    fn shutdown(&mut self, status: jack::ClientStatus, reason: &str) {
        log::warn!("JACK server shut down ({:?}): {}", status, reason);
    }
}
