use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::cache::LibraryCache;
use crate::config::LibrarySettings;

use super::art::ArtResolver;
use super::model::{Album, Track};
use super::scan::{audio_files_in, scan_albums};
use super::tags::fallback_title;
use super::uri::path_to_uri;

/// Messages posted by background library work to the main loop.
#[derive(Debug, Clone)]
pub enum LibraryEvent {
    /// The cached snapshot was read; `None` means it was missing or unusable.
    CacheLoaded(Option<Vec<Album>>),
    /// A scan is still running; this is the album list so far.
    Partial(Vec<Album>),
    /// A scan completed and its result was written to the cache.
    Finished(Vec<Album>),
}

/// What the main loop should do after applying a `LibraryEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryUpdate {
    Updated,
    /// Nothing usable was cached: an initial scan should start.
    NeedsScan,
    ScanFinished,
}

/// The album index. Owned by the main loop; scans run on a background
/// thread and report back through `LibraryEvent`.
pub struct LibraryIndex {
    albums: Vec<Album>,
    scanning: bool,
    cache: LibraryCache,
    art: Arc<ArtResolver>,
    settings: LibrarySettings,
}

impl LibraryIndex {
    pub fn new(cache: LibraryCache, art: Arc<ArtResolver>, settings: LibrarySettings) -> Self {
        Self {
            albums: Vec::new(),
            scanning: false,
            cache,
            art,
            settings,
        }
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Read the cached snapshot off the main loop.
    pub fn load_cached<F>(&self, post: F)
    where
        F: Fn(LibraryEvent) + Send + 'static,
    {
        let cache = self.cache.clone();
        thread::spawn(move || {
            post(LibraryEvent::CacheLoaded(cache.load()));
        });
    }

    /// Start a full scan of `root`. Returns `false` (and does nothing) when
    /// a scan is already running or `root` is not a directory.
    pub fn start_scan<F>(&mut self, root: &Path, post: F) -> bool
    where
        F: Fn(LibraryEvent) + Send + 'static,
    {
        if self.scanning {
            debug!("library scan already running");
            return false;
        }
        if !root.is_dir() {
            warn!(root = %root.display(), "library path is not a directory");
            return false;
        }

        self.scanning = true;
        let root: PathBuf = root.to_path_buf();
        let art = Arc::clone(&self.art);
        let settings = self.settings.clone();
        let cache = self.cache.clone();

        info!(root = %root.display(), "library scan started");
        thread::spawn(move || {
            let albums = scan_albums(&root, &settings, &art, |partial| {
                post(LibraryEvent::Partial(partial.to_vec()));
            });
            if let Err(e) = cache.save(&albums) {
                warn!(path = %cache.path().display(), error = %e, "failed to save library cache");
            }
            info!(albums = albums.len(), "library scan finished");
            post(LibraryEvent::Finished(albums));
        });
        true
    }

    /// Apply a background result; the album list is only ever swapped whole.
    pub fn apply(&mut self, event: LibraryEvent) -> LibraryUpdate {
        match event {
            LibraryEvent::CacheLoaded(Some(albums)) => {
                info!(albums = albums.len(), "library cache loaded");
                self.albums = albums;
                LibraryUpdate::Updated
            }
            LibraryEvent::CacheLoaded(None) => LibraryUpdate::NeedsScan,
            LibraryEvent::Partial(albums) => {
                self.albums = albums;
                LibraryUpdate::Updated
            }
            LibraryEvent::Finished(albums) => {
                self.albums = albums;
                self.scanning = false;
                LibraryUpdate::ScanFinished
            }
        }
    }

    /// Tracks of one album folder, ordered by track number then title.
    ///
    /// Each track keeps its own embedded art; the album art fills in for
    /// tracks without any.
    pub fn get_album_tracks(&self, album: &Album) -> Vec<Track> {
        let reader = self.art.tag_reader();
        let mut numbered: Vec<(u32, Track)> = audio_files_in(&album.folder, &self.settings)
            .into_iter()
            .filter_map(|path| {
                let uri = match path_to_uri(&path) {
                    Ok(u) => u,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping file");
                        return None;
                    }
                };
                let tags = reader.read_tags(&path).unwrap_or_else(|e| {
                    debug!(path = %path.display(), error = %e, "unreadable tags");
                    Default::default()
                });
                let mut track = Track::new(
                    uri,
                    Some(tags.title.clone().unwrap_or_else(|| fallback_title(&path))),
                    tags.artist.clone().or_else(|| Some(album.artist.clone())),
                    tags.album.clone().or_else(|| Some(album.title.clone())),
                    tags.duration_ns(),
                );
                if let Some(art) = self.art.embedded_art(&path).or_else(|| album.art.clone()) {
                    track.set_art(art);
                }
                Some((tags.track_number.unwrap_or(0), track))
            })
            .collect();

        numbered.sort_by(|(na, a), (nb, b)| na.cmp(nb).then_with(|| a.title.cmp(&b.title)));
        numbered.into_iter().map(|(_, t)| t).collect()
    }

    /// Every track of every album. Walks all album folders.
    pub fn all_tracks(&self) -> Vec<Track> {
        self.albums
            .iter()
            .flat_map(|a| self.get_album_tracks(a))
            .collect()
    }
}
