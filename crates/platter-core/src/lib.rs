//! Platter Core - Real-time bridge between timecode decks and JACK

pub mod audio;
pub mod types;

pub use types::*;
