//! Playback engine seam and its rodio implementation.
//!
//! The orchestrator only talks to `PlaybackEngine`; `RodioEngine` runs the
//! output stream on its own thread and reports back through an
//! `EventSink`. `RodioProber`/`RodioAnalyzer` reuse the same decoder for
//! discovery and offline waveform analysis.

mod level;
mod player;
mod probe;
mod sink;
mod thread;
mod types;

pub use level::{LevelMeter, LevelScan, LevelTap, SILENCE_DB, rms_db};
pub use player::RodioEngine;
pub use probe::{RodioAnalyzer, RodioProber};
pub use types::*;
