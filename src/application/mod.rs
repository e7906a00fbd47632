//! Application layer: the session lifecycle and event routing.

pub mod event_pump;
pub mod session;

pub use session::Session;
