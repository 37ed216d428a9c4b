//! Real-time audio bridging between timecode decks and JACK
//!
//! Each deck is a virtual turntable: it captures a stereo timecode signal
//! (an external [`TimecodeDecoder`] derives needle position and speed from
//! it) and emits the playback audio an external [`PlayerSource`] produces.
//! This module owns the plumbing in between: the client session, per-deck
//! port binding, fixed-point sample conversion, and the process callback
//! that fans one period of work out across all decks.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  connect / register / start   ┌──────────────────┐
//! │  Setup thread  │──────────────────────────────►│   AudioSession   │
//! └────────────────┘                               └────────┬─────────┘
//!                                                           │ activate
//!                                                           ▼ (roster moves)
//! ┌────────────────┐   process(nframes), per deck  ┌──────────────────┐
//! │ JACK RT thread │──────────────────────────────►│    Dispatcher    │
//! └────────────────┘                               └──────────────────┘
//! ```
//!
//! The process callback never blocks, never allocates, and surfaces no
//! per-deck failure: conversion scratch is preallocated at registration, and
//! the deck roster is frozen at activation.
//!
//! # Example Usage
//!
//! ```ignore
//! use platter_core::audio::{AudioSession, Device, SessionConfig};
//!
//! let session = AudioSession::connect(SessionConfig::default())?;
//! let mut deck = session.register_deck("deckA", Some(decoder), player)?;
//!
//! // The first deck to start brings the whole graph live
//! deck.start()?;
//! ```

mod config;
mod convert;
mod deck;
mod device;
mod dispatch;
mod error;
mod session;

pub use config::{
    OverflowPolicy, SessionConfig, DEFAULT_CLIENT_NAME, DEFAULT_MAX_DECKS,
    DEFAULT_MAX_PERIOD_FRAMES,
};
pub use convert::{deinterleave, interleave};
pub use deck::{PlayerSource, TimecodeDecoder};
pub use device::Device;
pub use error::{AudioError, AudioResult};
pub use session::{AudioSession, JackDevice};
