//! Server-Sent Events support for live-updating admin views

mod broadcaster;
mod events;

pub use broadcaster::SseBroadcaster;
pub use events::{PulseEvent, SessionChange};
