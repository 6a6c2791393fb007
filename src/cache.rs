//! On-disk content caches: the library snapshot and per-track waveforms.
//!
//! Both stores live under the configured cache directory and treat a
//! missing or unreadable entry as a miss, never as an error.

mod library;
mod waveform;

pub(crate) mod b64;

pub use library::LibraryCache;
pub use waveform::{WaveformCache, uri_key};

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Write `bytes` to a sibling temp file, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
