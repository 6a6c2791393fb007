use std::path::PathBuf;

use serde::Deserialize;

use super::load::{default_cache_dir, default_data_config_dir};

/// Engine configuration loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/mamo/config.toml` or `~/.config/mamo/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MAMO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub paths: PathSettings,
    pub analysis: AnalysisSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Holds `settings.json` and the default `playlist.json`.
    pub config_dir: PathBuf,
    /// Holds `library.json` and the `waveforms/` directory.
    pub cache_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_dir: default_data_config_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl PathSettings {
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub fn playlist_file(&self) -> PathBuf {
        self.config_dir.join("playlist.json")
    }

    pub fn library_cache_file(&self) -> PathBuf {
        self.cache_dir.join("library.json")
    }

    pub fn waveform_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("waveforms")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Loudness meter interval of the offline analysis pass (milliseconds).
    pub interval_ms: u64,
    /// Upper bound on stored waveform samples per track.
    pub max_samples: usize,
    /// Loudness meter interval of the main playback stream (milliseconds).
    pub live_interval_ms: u64,
    /// Push live samples to the display every N loudness events.
    pub live_push_every: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            max_samples: 3000,
            live_interval_ms: 250,
            live_push_every: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Progress poll period while playing (milliseconds).
    pub progress_interval_ms: u64,
    /// `prev` restarts the current track instead of moving back once this
    /// much of it has played (milliseconds).
    pub prev_restart_threshold_ms: u64,
    /// How long a transport error notification stays visible (milliseconds).
    pub notification_ms: u64,
    /// Quiet period before the playlist is written to disk (milliseconds).
    pub save_debounce_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            prev_restart_threshold_ms: 3000,
            notification_ms: 5000,
            save_debounce_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Emit a partial library update every N newly found albums.
    pub partial_batch: usize,
    /// How many files of an album folder are probed for embedded art.
    pub art_probe_files: usize,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "ogg".into(),
                "opus".into(),
                "m4a".into(),
                "wav".into(),
                "aac".into(),
            ],
            follow_links: true,
            include_hidden: false,
            partial_batch: 10,
            art_probe_files: 5,
        }
    }
}
