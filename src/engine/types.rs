//! Engine-facing types: states, events, the `PlaybackEngine` seam and the
//! probe/analysis capabilities used by discovery and the analysis worker.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Engine pipeline state as requested by `set_state` and reported back in
/// `EngineEvent::StateChanged`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing loaded; all decode resources released.
    #[default]
    Null,
    Paused,
    Playing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Null => "null",
            EngineState::Paused => "paused",
            EngineState::Playing => "playing",
        };
        f.write_str(s)
    }
}

/// Asynchronous notifications from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged { old: EngineState, new: EngineState },
    /// The current stream ran out. Sent once per stream.
    Eos,
    Error(String),
    /// Duration became known; query it with `query_duration`.
    DurationChanged,
    /// Per-channel loudness in dB from the playback pipeline's meter.
    Loudness(Vec<f64>),
}

/// Where an engine delivers its events. Called from engine threads.
pub type EventSink = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// Seek behaviour flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SeekFlags {
    /// Drop queued audio so the new position is heard immediately.
    pub flush: bool,
    /// Land exactly on the requested time instead of the nearest key point.
    pub accurate: bool,
}

impl SeekFlags {
    pub const FLUSH: SeekFlags = SeekFlags {
        flush: true,
        accurate: false,
    };
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),

    #[error("no URI set")]
    NoUri,

    #[error("failed to open {uri}: {reason}")]
    Open { uri: String, reason: String },

    #[error("failed to decode {uri}: {reason}")]
    Decode { uri: String, reason: String },

    #[error("engine thread is gone")]
    Disconnected,
}

/// The decode/output engine as the orchestrator sees it.
///
/// Commands may complete asynchronously; the outcome is reported through
/// the engine's `EventSink`.
pub trait PlaybackEngine {
    fn set_uri(&mut self, uri: &str);
    fn set_state(&mut self, state: EngineState) -> Result<(), EngineError>;
    fn state(&self) -> EngineState;
    /// Current position in nanoseconds.
    fn query_position(&self) -> Option<u64>;
    /// Stream duration in nanoseconds, once known.
    fn query_duration(&self) -> Option<u64>;
    fn seek(&mut self, position_ns: u64, flags: SeekFlags) -> Result<(), EngineError>;
}

/// What the engine's own prober can tell about a URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ns: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("unsupported URI: {0}")]
    UnsupportedUri(String),

    #[error("missing codec for {0}")]
    MissingCodec(String),

    #[error("{0}")]
    Other(String),
}

pub trait Prober: Send + Sync {
    fn probe(&self, uri: &str) -> Result<ProbeInfo, ProbeError>;
}

/// One message from a short-lived analysis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    /// Per-channel loudness in dB for one interval.
    Level(Vec<f64>),
    Eos,
    Error(String),
}

pub type LevelStream = Box<dyn Iterator<Item = LevelEvent> + Send>;

/// Builds decode-and-measure pipelines separate from playback.
pub trait Analyzer: Send + Sync {
    fn open(&self, uri: &str, interval: Duration) -> Result<LevelStream, EngineError>;
}

/// Snapshot the engine thread keeps current for synchronous queries.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    pub state: EngineState,
    pub duration: Option<Duration>,
    /// Position accumulated up to `started_at`.
    pub accumulated: Duration,
    /// Set while audio is actually advancing.
    pub started_at: Option<Instant>,
}

impl EngineStatus {
    pub fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

pub type StatusHandle = Arc<Mutex<EngineStatus>>;

pub fn duration_to_ns(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}
