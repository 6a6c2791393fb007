use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::library::{Album, ArtBytes, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

use super::write_atomic;

/// One album as stored in `library.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AlbumRecord {
    #[serde(default = "unknown_album")]
    pub title: String,
    #[serde(default = "unknown_artist")]
    pub artist: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default, with = "super::b64")]
    pub art_base64: Option<ArtBytes>,
}

fn unknown_album() -> String {
    UNKNOWN_ALBUM.to_string()
}

fn unknown_artist() -> String {
    UNKNOWN_ARTIST.to_string()
}

impl From<&Album> for AlbumRecord {
    fn from(a: &Album) -> Self {
        Self {
            title: a.title.clone(),
            artist: a.artist.clone(),
            folder: a.folder.display().to_string(),
            art_base64: a.art.clone(),
        }
    }
}

impl From<AlbumRecord> for Album {
    fn from(r: AlbumRecord) -> Self {
        Self {
            title: r.title,
            artist: r.artist,
            folder: PathBuf::from(r.folder),
            art: r.art_base64,
        }
    }
}

/// Snapshot of the whole album list, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct LibraryCache {
    path: PathBuf,
}

impl LibraryCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the snapshot is missing or unreadable; callers treat
    /// that as an empty library and rescan.
    pub fn load(&self) -> Option<Vec<Album>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no library cache");
                return None;
            }
        };
        match serde_json::from_str::<Vec<AlbumRecord>>(&raw) {
            Ok(records) => Some(records.into_iter().map(Album::from).collect()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed library cache");
                None
            }
        }
    }

    pub fn save(&self, albums: &[Album]) -> Result<()> {
        let records: Vec<AlbumRecord> = albums.iter().map(AlbumRecord::from).collect();
        let json = serde_json::to_vec(&records)?;
        write_atomic(&self.path, &json)
    }
}
