//! Commands and state shared with external control surfaces.

use crate::library::ArtBytes;
use crate::orchestrator::PlayerState;

/// Transport commands accepted from any control surface. They are handled
/// exactly like the equivalent in-app actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

impl From<PlayerState> for PlaybackStatus {
    fn from(state: PlayerState) -> Self {
        match state {
            // A requested start counts as playing for the outside world.
            PlayerState::Playing | PlayerState::Loading => PlaybackStatus::Playing,
            PlayerState::Paused => PlaybackStatus::Paused,
            PlayerState::Idle | PlayerState::Stopped => PlaybackStatus::Stopped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TrackMetadata {
    /// Playlist position, used to build a track object path.
    pub index: usize,
    pub uri: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub length_us: Option<u64>,
    pub art: Option<ArtBytes>,
}

/// Read-only view of the transport handed to control surfaces.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ControlSnapshot {
    pub status: PlaybackStatus,
    pub metadata: Option<TrackMetadata>,
    pub position_us: u64,
}
