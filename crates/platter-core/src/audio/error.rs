//! Audio bridge error types

use thiserror::Error;

/// Errors that can occur while setting up the JACK bridge
///
/// All of these are setup-time failures and fatal to the deck (or session)
/// being initialized. The process callback has no recoverable error path:
/// a broken buffer contract inside it aborts instead.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Cannot open a session with the JACK server
    #[error("Failed to connect to JACK: {0}")]
    Connection(String),

    /// JACK refused the process callback at activation
    #[error("Failed to install the process callback: {0}")]
    CallbackRegistration(String),

    /// The client could not be brought into the rolling state
    #[error("Failed to activate the JACK client: {0}")]
    Activation(String),

    /// One of a deck's four ports could not be created
    #[error("Failed to register port {port}: {reason}")]
    PortRegistration { port: String, reason: String },

    /// A deck's conversion scratch could not be reserved
    #[error("Failed to allocate deck conversion buffer: {0}")]
    Allocation(String),

    /// Checked roster insertion past the configured deck limit
    #[error("Deck roster is full ({max} decks)")]
    DeckCapacity { max: usize },

    /// The server period does not fit the configured scratch bound
    #[error("JACK period of {requested} frames exceeds the configured maximum of {capacity}")]
    BufferContract { requested: usize, capacity: usize },

    /// Deck registration attempted after the client went live
    #[error("Decks cannot be registered once the client is active")]
    RegistrationClosed,
}

/// Result type for audio bridge operations
pub type AudioResult<T> = Result<T, AudioError>;
