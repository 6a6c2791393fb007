//! Playback orchestration: the transport state machine between the user,
//! the playlist and the engine.

mod machine;
mod state;

pub use machine::Orchestrator;
pub use state::{Notice, PlaybackFlags, PlayerState};

#[cfg(test)]
mod tests;
