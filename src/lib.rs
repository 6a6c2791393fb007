//! Background engine for a desktop music player.
//!
//! `App` owns discovery, the album library, waveform analysis, the playlist
//! and the playback orchestrator. A presentation layer drives it through
//! its transport, playlist, library and settings operations and reads the
//! `NowPlaying` view model; `runtime::run` wires it to rodio and MPRIS.

pub mod analysis;
pub mod app;
pub mod cache;
pub mod config;
pub mod control;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod library;
pub mod mpris;
pub mod orchestrator;
pub mod playlist;
pub mod runtime;

#[cfg(test)]
mod testing;
