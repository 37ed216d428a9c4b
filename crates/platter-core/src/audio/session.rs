//! Audio session - JACK client lifecycle and the deck roster
//!
//! One session per bridge: it opens the JACK client, owns the bounded deck
//! roster while configured, and hands the roster to the dispatcher when the
//! first deck starts. The sample rate is discovered at connect time and never
//! changes afterwards.
//!
//! Setup (connect, register, start) is single-threaded caller code guarded by
//! a mutex that the process callback never touches; once the client is active
//! the JACK real-time thread owns all deck state exclusively.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jack::{AsyncClient, Client, ClientOptions};

use super::config::SessionConfig;
use super::deck::{DeckContext, DeckPorts, DeckState, PlayerSource, Roster, TimecodeDecoder};
use super::device::Device;
use super::dispatch::{Dispatcher, Notifications};
use super::error::{AudioError, AudioResult};

/// Lifecycle of the shared client
///
/// `activate` drives Configured → Active exactly once. A failed transition
/// leaves the state poisoned, because the underlying client is consumed by
/// the activation attempt.
enum Lifecycle<C, A> {
    Configured(C),
    Active(A),
    Poisoned,
}

impl<C, A> Lifecycle<C, A> {
    /// Run the transition if the state is still configured
    ///
    /// Returns `Ok(true)` if the transition ran, `Ok(false)` if the state was
    /// already active (the call is a no-op).
    fn activate<E>(
        &mut self,
        transition: impl FnOnce(C) -> Result<A, E>,
        poisoned: impl FnOnce() -> E,
    ) -> Result<bool, E> {
        match std::mem::replace(self, Lifecycle::Poisoned) {
            Lifecycle::Active(active) => {
                *self = Lifecycle::Active(active);
                Ok(false)
            }
            Lifecycle::Configured(setup) => match transition(setup) {
                Ok(active) => {
                    *self = Lifecycle::Active(active);
                    Ok(true)
                }
                Err(e) => Err(e),
            },
            Lifecycle::Poisoned => Err(poisoned()),
        }
    }
}

/// Pre-activation session state: the inactive client and the roster
struct Setup {
    client: Client,
    roster: Roster<DeckContext>,
}

type SessionState = Lifecycle<Setup, AsyncClient<Notifications, Dispatcher>>;

/// State shared between the session and its deck device handles
struct SessionShared {
    config: SessionConfig,
    client_name: String,
    sample_rate: u32,
    buffer_size: u32,
    decks_registered: AtomicUsize,
    state: Mutex<SessionState>,
}

impl SessionShared {
    /// Bring the graph live. The first call activates the client; later calls
    /// are no-ops. Every deck's `start()` lands here.
    fn activate(&self) -> AudioResult<()> {
        let mut state = self.state.lock().unwrap();

        let sample_rate = self.sample_rate;
        let max_period_frames = self.config.max_period_frames;
        state.activate(
            |Setup { client, roster }| {
                let deck_count = roster.len();
                let dispatcher = Dispatcher::new(roster, sample_rate, max_period_frames);
                match client.activate_async(Notifications, dispatcher) {
                    Ok(active) => {
                        log::info!("JACK client activated ({} decks live)", deck_count);
                        Ok(active)
                    }
                    Err(e @ jack::Error::CallbackRegistrationError) => {
                        log::error!("JACK process callback registration failed: {}", e);
                        Err(AudioError::CallbackRegistration(e.to_string()))
                    }
                    Err(e) => {
                        log::error!("JACK activation failed: {}", e);
                        Err(AudioError::Activation(e.to_string()))
                    }
                }
            },
            || AudioError::Activation("session is unusable after an earlier activation failure".into()),
        )?;
        Ok(())
    }

    /// Release a deck's conversion scratch
    ///
    /// Only possible while the session is still configured; once active the
    /// real-time thread owns deck state, and the memory is released when the
    /// session is dropped.
    fn clear_deck(&self, index: usize) -> AudioResult<()> {
        let mut state = self.state.lock().unwrap();
        match &mut *state {
            Lifecycle::Configured(setup) => {
                if let Some(deck) = setup.roster.get_mut(index) {
                    deck.state.clear();
                    log::debug!("Cleared deck '{}'", deck.state.name());
                }
                Ok(())
            }
            Lifecycle::Active(_) => {
                log::debug!("clear() on a live session is deferred to session drop");
                Ok(())
            }
            Lifecycle::Poisoned => Ok(()),
        }
    }
}

/// The connection to the JACK graph and the roster of decks behind it
///
/// Exactly one session exists per bridge. Decks are registered against it,
/// and the first deck to start brings the whole graph live. Dropping the
/// session deactivates the client.
pub struct AudioSession {
    shared: Arc<SessionShared>,
}

impl AudioSession {
    /// Open the JACK client and fix the session sample rate
    ///
    /// Also verifies that the server period fits the configured scratch
    /// bound, so the dispatcher can never be asked for more frames than it
    /// can carry.
    pub fn connect(config: SessionConfig) -> AudioResult<Self> {
        let (client, _status) = Client::new(&config.client_name, ClientOptions::NO_START_SERVER)
            .map_err(|e| AudioError::Connection(e.to_string()))?;

        let client_name = client.name().to_string();
        let sample_rate = client.sample_rate() as u32;
        let buffer_size = client.buffer_size();

        if buffer_size as usize > config.max_period_frames {
            return Err(AudioError::BufferContract {
                requested: buffer_size as usize,
                capacity: config.max_period_frames,
            });
        }

        log::info!(
            "JACK client '{}' created (sample rate: {}Hz, period: {} frames, latency: {:.1}ms)",
            client_name,
            sample_rate,
            buffer_size,
            (buffer_size as f32 / sample_rate as f32) * 1000.0
        );

        let roster = Roster::with_capacity(config.max_decks);
        Ok(Self {
            shared: Arc::new(SessionShared {
                client_name,
                sample_rate,
                buffer_size,
                decks_registered: AtomicUsize::new(0),
                state: Mutex::new(Lifecycle::Configured(Setup { client, roster })),
                config,
            }),
        })
    }

    /// Register a new deck: four ports named from the deck name, a scratch
    /// buffer, and the deck's collaborators
    ///
    /// Fails cleanly when the roster is full or the client is already active.
    /// A port failure aborts the deck; ports created before the failure stay
    /// with the client.
    pub fn register_deck(
        &self,
        name: &str,
        timecoder: Option<Box<dyn TimecodeDecoder>>,
        player: Box<dyn PlayerSource>,
    ) -> AudioResult<JackDevice> {
        let mut state = self.shared.state.lock().unwrap();
        let setup = match &mut *state {
            Lifecycle::Configured(setup) => setup,
            _ => return Err(AudioError::RegistrationClosed),
        };

        // Check capacity before touching the client so a full roster never
        // creates orphan ports
        if !setup.roster.has_space() {
            return Err(AudioError::DeckCapacity {
                max: self.shared.config.max_decks,
            });
        }

        let deck_state = DeckState::new(
            name,
            self.shared.config.max_period_frames,
            self.shared.config.overflow,
            timecoder,
            player,
        )?;
        let ports = DeckPorts::register(&setup.client, name)?;

        let index = setup.roster.len();
        setup.roster.push(DeckContext {
            ports,
            state: deck_state,
        })?;
        self.shared.decks_registered.fetch_add(1, Ordering::Relaxed);

        log::info!("Registered deck '{}' with timecode and playback ports", name);

        Ok(JackDevice {
            shared: Arc::clone(&self.shared),
            index,
            name: name.to_string(),
        })
    }

    /// Bring the whole graph live
    ///
    /// Equivalent to the first deck's `start()`; calling it again is a no-op.
    pub fn activate(&self) -> AudioResult<()> {
        self.shared.activate()
    }

    /// Whether the server is currently driving the process callback
    pub fn is_active(&self) -> bool {
        matches!(&*self.shared.state.lock().unwrap(), Lifecycle::Active(_))
    }

    /// Sample rate fixed at connect time
    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }

    /// Server period in frames, as reported at connect time
    pub fn buffer_size(&self) -> u32 {
        self.shared.buffer_size
    }

    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.shared.buffer_size as f32 / self.shared.sample_rate as f32) * 1000.0
    }

    /// Actual client name (the server may rename on collision)
    pub fn client_name(&self) -> &str {
        &self.shared.client_name
    }

    /// Number of registered decks
    pub fn deck_count(&self) -> usize {
        self.shared.decks_registered.load(Ordering::Relaxed)
    }
}

/// Device handle for one JACK deck
pub struct JackDevice {
    shared: Arc<SessionShared>,
    index: usize,
    name: String,
}

impl JackDevice {
    /// Deck name the port names were derived from
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Device for JackDevice {
    /// On the first call to start, start audio rolling for all decks
    fn start(&mut self) -> AudioResult<()> {
        self.shared.activate()
    }

    /// The shared client offers no per-deck mute once the graph rolls; the
    /// call succeeds without effect
    fn stop(&mut self) -> AudioResult<()> {
        Ok(())
    }

    fn clear(&mut self) -> AudioResult<()> {
        self.shared.clear_deck(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::Lifecycle;

    #[test]
    fn test_activation_runs_exactly_once() {
        let mut lifecycle: Lifecycle<u32, u32> = Lifecycle::Configured(7);
        let mut runs = 0;

        for call in 0..3 {
            let ran = lifecycle
                .activate(
                    |setup| {
                        runs += 1;
                        Ok::<_, ()>(setup + 1)
                    },
                    || (),
                )
                .unwrap();
            assert_eq!(ran, call == 0);
        }

        assert_eq!(runs, 1);
        assert!(matches!(lifecycle, Lifecycle::Active(8)));
    }

    #[test]
    fn test_failed_activation_poisons_the_state() {
        let mut lifecycle: Lifecycle<u32, u32> = Lifecycle::Configured(7);

        let err = lifecycle
            .activate(|_| Err("activation failed"), || "poisoned")
            .unwrap_err();
        assert_eq!(err, "activation failed");

        // The client was consumed by the failed attempt; nothing can revive it
        let err = lifecycle
            .activate(|setup| Ok(setup), || "poisoned")
            .unwrap_err();
        assert_eq!(err, "poisoned");
    }
}
