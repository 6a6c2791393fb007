use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;

use super::write_atomic;

/// Stable cache key for a track: hex SHA-256 of its URI.
pub fn uri_key(uri: &str) -> String {
    hex::encode(Sha256::digest(uri.as_bytes()))
}

/// One JSON array of floats per track, named `<uri_key>.json`.
#[derive(Debug, Clone)]
pub struct WaveformCache {
    dir: PathBuf,
}

impl WaveformCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self, uri: &str) -> PathBuf {
        self.dir.join(format!("{}.json", uri_key(uri)))
    }

    /// Pure read. Missing, corrupt or empty entries are a miss.
    pub fn load(&self, uri: &str) -> Option<Vec<f32>> {
        let path = self.entry_path(uri);
        let raw = fs::read(&path).ok()?;
        match serde_json::from_slice::<Vec<f32>>(&raw) {
            Ok(samples) if !samples.is_empty() => Some(samples),
            Ok(_) => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "corrupt waveform cache entry");
                None
            }
        }
    }

    pub fn save(&self, uri: &str, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_vec(samples)?;
        write_atomic(&self.entry_path(uri), &json)
    }
}
