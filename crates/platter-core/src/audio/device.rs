//! Backend device capability interface
//!
//! Callers drive a deck through an opaque handle rather than a struct of
//! backend-specific fields. Sibling backends (e.g. an ALSA bridge) implement
//! the same trait, so the rest of the application never sees which backend a
//! deck lives on.

use std::any::Any;
use std::os::fd::RawFd;

use super::error::AudioResult;

/// One deck as seen by the rest of the application
pub trait Device: Send {
    /// Start audio rolling on this deck
    fn start(&mut self) -> AudioResult<()>;

    /// Stop audio rolling on this deck
    fn stop(&mut self) -> AudioResult<()>;

    /// Release the deck's local resources
    fn clear(&mut self) -> AudioResult<()>;

    /// File descriptors to poll for backends driven by the application's own
    /// event loop. JACK drives its own thread, so the default is empty.
    fn poll_descriptors(&self) -> &[RawFd] {
        &[]
    }

    /// Backend-native handle, for backends that expose one
    fn native_handle(&self) -> Option<&dyn Any> {
        None
    }
}
