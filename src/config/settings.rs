use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::write_atomic;
use crate::error::Result;

use super::load::default_library_path;

/// User-facing toggles persisted as one flat JSON document.
///
/// Every key has an explicit default, so older or partial documents load
/// cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Advance to the next track when the current one finishes.
    pub auto_play: bool,
    /// Replay the current track when it finishes.
    pub repeat: bool,
    /// `next`/`prev` wrap around the playlist boundaries.
    pub loop_all: bool,
    /// Start with an empty playlist instead of restoring the saved one.
    pub clear_on_start: bool,
    /// Presentation hint for the display layer.
    pub dark_mode: bool,
    /// Root folder of the album library.
    pub library_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_play: true,
            repeat: false,
            loop_all: false,
            clear_on_start: false,
            dark_mode: false,
            library_path: default_library_path(),
        }
    }
}

/// Owns the settings document: loaded once, rewritten whole on each change.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Settings,
}

impl SettingsStore {
    /// Load settings from `path`; a missing or malformed document yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_settings(&path) {
            Ok(Some(s)) => s,
            Ok(None) => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
                Settings::default()
            }
        };
        Self { path, current }
    }

    pub fn get(&self) -> &Settings {
        &self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist the full document.
    ///
    /// A failed write is logged; the in-memory value keeps the change.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.current);
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "failed to save settings");
        }
    }

    /// Atomic whole-document rewrite.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.current)?;
        write_atomic(&self.path, &json)
    }
}

fn read_settings(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}
