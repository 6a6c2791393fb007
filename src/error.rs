//! Crate-wide error type.
//!
//! Component boundaries that need to branch on the failure kind carry their
//! own enums (`engine::EngineError`, `engine::ProbeError`,
//! `discovery::DiscoveryError`); everything else converges here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("playback engine error: {0}")]
    Engine(#[from] crate::engine::EngineError),

    #[error("discovery failed: {0}")]
    Discovery(#[from] crate::discovery::DiscoveryError),

    #[error("tag read failed for {path}: {reason}")]
    Tag { path: String, reason: String },

    #[error("not a local file URI: {0}")]
    Uri(String),

    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
