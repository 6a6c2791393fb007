use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{WaveformCache, write_atomic};
use crate::error::Result;
use crate::library::{ArtBytes, TagReader, Track, uri_to_path};

/// One entry of the playlist document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TrackRecord {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_ns: u64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::cache::b64"
    )]
    pub album_art_b64: Option<ArtBytes>,
}

impl From<&Track> for TrackRecord {
    fn from(t: &Track) -> Self {
        Self {
            uri: t.uri().to_string(),
            title: Some(t.title.clone()),
            artist: Some(t.artist.clone()),
            duration_ns: t.duration_ns,
            album_art_b64: t.art().cloned(),
        }
    }
}

impl From<TrackRecord> for Track {
    fn from(r: TrackRecord) -> Self {
        let mut t = Track::new(r.uri, r.title, r.artist, None, r.duration_ns);
        if let Some(art) = r.album_art_b64 {
            t.set_art(art);
        }
        t
    }
}

/// Write `tracks` as a pretty-printed JSON array.
pub fn save_to(path: &Path, tracks: &[Track]) -> Result<()> {
    let records: Vec<TrackRecord> = tracks.iter().map(TrackRecord::from).collect();
    let json = serde_json::to_vec_pretty(&records)?;
    write_atomic(path, &json)?;
    debug!(path = %path.display(), tracks = tracks.len(), "playlist saved");
    Ok(())
}

/// Read a playlist document. Entries without a usable URI are skipped.
pub fn load_from(path: &Path) -> Result<Vec<Track>> {
    let raw = fs::read_to_string(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
    let tracks = values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<TrackRecord>(v) {
            Ok(r) if !r.uri.is_empty() => Some(Track::from(r)),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "skipping malformed playlist entry");
                None
            }
        })
        .collect();
    Ok(tracks)
}

#[derive(Debug, Clone)]
pub enum PlaylistEvent {
    /// A background load finished. `Err` carries a message for the user.
    Loaded {
        path: PathBuf,
        tracks: std::result::Result<Vec<Track>, String>,
    },
    /// Durations recovered from tags, by URI.
    Repaired(Vec<(String, u64)>),
}

/// Load `path` off the main loop, attaching cached waveforms.
pub fn spawn_load<F>(path: PathBuf, cache: WaveformCache, post: F)
where
    F: Fn(PlaylistEvent) + Send + 'static,
{
    thread::spawn(move || {
        let tracks = load_from(&path)
            .map(|mut tracks| {
                for t in tracks.iter_mut() {
                    if let Some(samples) = cache.load(t.uri()) {
                        t.set_waveform(samples);
                    }
                }
                info!(path = %path.display(), tracks = tracks.len(), "playlist loaded");
                tracks
            })
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "failed to load playlist");
                e.to_string()
            });
        post(PlaylistEvent::Loaded { path, tracks });
    });
}

/// Re-read durations from tags for every URI given, off the main loop.
pub fn spawn_repair<F>(uris: Vec<String>, tags: Arc<dyn TagReader>, post: F)
where
    F: Fn(PlaylistEvent) + Send + 'static,
{
    if uris.is_empty() {
        return;
    }
    thread::spawn(move || {
        let repaired: Vec<(String, u64)> = uris
            .into_iter()
            .filter_map(|uri| {
                let path = uri_to_path(&uri).ok()?;
                let info = tags.read_tags(&path).ok()?;
                let ns = info.duration_ns();
                (ns > 0).then_some((uri, ns))
            })
            .collect();
        debug!(repaired = repaired.len(), "duration repair done");
        post(PlaylistEvent::Repaired(repaired));
    });
}

/// Delays saves until changes stop for `quiet`.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Note a change; pushes the deadline out again.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once, when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume a pending save regardless of the deadline (shutdown).
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
