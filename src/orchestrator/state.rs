use std::fmt;

use crate::config::Settings;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// URI handed to the engine, waiting for it to start.
    Loading,
    Playing,
    Paused,
    /// Explicit stop, error, or end of stream without continuation.
    Stopped,
}

impl PlayerState {
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerState::Idle => "idle",
            PlayerState::Loading => "loading",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// The user toggles that steer transport decisions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlaybackFlags {
    pub auto_play: bool,
    pub repeat: bool,
    pub loop_all: bool,
}

impl From<&Settings> for PlaybackFlags {
    fn from(s: &Settings) -> Self {
        Self {
            auto_play: s.auto_play,
            repeat: s.repeat,
            loop_all: s.loop_all,
        }
    }
}

/// Side effects the orchestrator asks its owner to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The current track changed; `None` means nothing is current.
    TrackChanged(Option<String>),
    StatusChanged(PlayerState),
    Progress {
        position_ns: u64,
        duration_ns: Option<u64>,
    },
    /// Playback jumped inside the current track.
    Seeked,
    /// Transport failure to show the user.
    Error(String),
    /// Playlist data changed and should be saved.
    PlaylistDirty,
}
