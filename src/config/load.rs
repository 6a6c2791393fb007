use std::{env, path::PathBuf};

use crate::error::{Error, Result};

use super::schema::EngineConfig;

/// Configuration loading helpers.
///
/// `EngineConfig::load` reads an optional config file, then environment
/// variables (prefix `MAMO__`), and falls back to struct defaults.
impl EngineConfig {
    /// Load configuration from the optional config file and environment.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MAMO")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("library.extensions"),
        );

        let cfg = builder.build()?;
        let loaded: EngineConfig = cfg.try_deserialize()?;
        Ok(loaded)
    }

    /// Reject values that would stall timers or never flush batches.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.interval_ms == 0 || self.analysis.live_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "analysis intervals must be >= 1ms".to_string(),
            ));
        }
        if self.analysis.max_samples == 0 {
            return Err(Error::InvalidConfig(
                "analysis.max_samples must be >= 1".to_string(),
            ));
        }
        if self.analysis.live_push_every == 0 {
            return Err(Error::InvalidConfig(
                "analysis.live_push_every must be >= 1".to_string(),
            ));
        }
        if self.playback.progress_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "playback.progress_interval_ms must be >= 1".to_string(),
            ));
        }
        if self.library.partial_batch == 0 {
            return Err(Error::InvalidConfig(
                "library.partial_batch must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve the config path from `MAMO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MAMO_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/mamo/config.toml`
/// or `~/.config/mamo/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    config_home().map(|d| d.join("mamo").join("config.toml"))
}

fn config_home() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    }
}

fn cache_home() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CACHE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache"))
    }
}

/// Directory for `settings.json` and `playlist.json`.
pub fn default_data_config_dir() -> PathBuf {
    config_home()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mamo")
}

/// Directory for `library.json` and the waveform cache.
pub fn default_cache_dir() -> PathBuf {
    cache_home()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mamo")
}

/// `~/Music`, or `Music` relative to the working directory without a home.
pub fn default_library_path() -> PathBuf {
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Music"))
        .unwrap_or_else(|| PathBuf::from("Music"))
}
