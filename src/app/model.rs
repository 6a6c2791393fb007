//! The application model: owns every component and applies background
//! results on the main loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::analysis::{
    AnalysisResult, AnalysisWorker, LiveAccumulator, LiveUpdate, RequestOutcome, WaveformSampler,
};
use crate::cache::{LibraryCache, WaveformCache};
use crate::config::{EngineConfig, Settings, SettingsStore};
use crate::control::{ControlCmd, ControlSnapshot, PlaybackStatus, TrackMetadata};
use crate::discovery::{self, Discoverer, DiscoveryEvent};
use crate::engine::{Analyzer, EngineEvent, EngineState, PlaybackEngine, Prober};
use crate::error::Result;
use crate::library::{
    ArtResolver, LibraryEvent, LibraryIndex, LibraryUpdate, TagReader, Track, path_to_uri,
};
use crate::orchestrator::{Notice, Orchestrator, PlaybackFlags, PlayerState};
use crate::playlist::{self, Playlist, PlaylistEvent, SaveDebouncer};

use super::now_playing::NowPlaying;

/// Everything background work posts back to the main loop.
#[derive(Debug)]
pub enum AppEvent {
    Engine(EngineEvent),
    Library(LibraryEvent),
    Discovery(DiscoveryEvent),
    Analysis(AnalysisResult),
    Playlist(PlaylistEvent),
}

/// Capabilities the app is built on.
pub struct Services {
    pub prober: Arc<dyn Prober>,
    pub analyzer: Arc<dyn Analyzer>,
    pub tags: Arc<dyn TagReader>,
}

fn post_to<T: 'static>(tx: &Sender<AppEvent>, wrap: fn(T) -> AppEvent) -> impl Fn(T) + Send + 'static {
    let tx = tx.clone();
    move |event| {
        let _ = tx.send(wrap(event));
    }
}

pub struct App<E: PlaybackEngine> {
    orchestrator: Orchestrator<E>,
    playlist: Playlist,
    library: LibraryIndex,
    analysis: AnalysisWorker,
    discoverer: Arc<Discoverer>,
    tags: Arc<dyn TagReader>,
    settings: SettingsStore,
    config: EngineConfig,
    saver: SaveDebouncer,
    live: LiveAccumulator,
    now_playing: NowPlaying,
    events: Sender<AppEvent>,
    /// Targets to open once the saved playlist has been restored.
    pending_open: Option<Vec<String>>,
    control_dirty: bool,
}

impl<E: PlaybackEngine> App<E> {
    pub fn new(
        engine: E,
        config: EngineConfig,
        settings: SettingsStore,
        services: Services,
        events: Sender<AppEvent>,
    ) -> Self {
        let flags = PlaybackFlags::from(settings.get());
        let art = Arc::new(ArtResolver::new(Arc::clone(&services.tags)));
        let sampler = WaveformSampler::new(services.analyzer, &config.analysis);
        let analysis = AnalysisWorker::spawn(
            sampler,
            WaveformCache::new(config.paths.waveform_cache_dir()),
            post_to(&events, AppEvent::Analysis),
        );
        let library = LibraryIndex::new(
            LibraryCache::new(config.paths.library_cache_file()),
            Arc::clone(&art),
            config.library.clone(),
        );

        Self {
            orchestrator: Orchestrator::new(engine, flags, &config.playback),
            playlist: Playlist::new(),
            library,
            analysis,
            discoverer: Arc::new(Discoverer::new(services.prober, art)),
            tags: services.tags,
            saver: SaveDebouncer::new(Duration::from_millis(config.playback.save_debounce_ms)),
            live: LiveAccumulator::new(&config.analysis),
            now_playing: NowPlaying::default(),
            settings,
            config,
            events,
            pending_open: None,
            control_dirty: true,
        }
    }

    fn poster<T: 'static>(&self, wrap: fn(T) -> AppEvent) -> impl Fn(T) + Send + 'static {
        post_to(&self.events, wrap)
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn library(&self) -> &LibraryIndex {
        &self.library
    }

    pub fn orchestrator(&self) -> &Orchestrator<E> {
        &self.orchestrator
    }

    pub fn engine(&self) -> &E {
        self.orchestrator.engine()
    }

    pub fn analysis(&self) -> &AnalysisWorker {
        &self.analysis
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.now_playing
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn state(&self) -> PlayerState {
        self.orchestrator.state()
    }

    #[cfg(test)]
    pub(crate) fn orchestrator_mut(&mut self) -> &mut Orchestrator<E> {
        &mut self.orchestrator
    }

    /// Restore the library and (unless `clear_on_start` is set) the saved
    /// playlist, then open `args`.
    pub fn start(&mut self, args: Vec<String>) {
        self.library.load_cached(self.poster(AppEvent::Library));

        if self.settings.get().clear_on_start {
            info!("clear_on_start set, not restoring the playlist");
            self.open_all(args);
            return;
        }
        self.pending_open = Some(args);
        playlist::spawn_load(
            self.config.paths.playlist_file(),
            self.analysis.cache().clone(),
            self.poster(AppEvent::Playlist),
        );
    }

    /// Open startup targets; the first discovered track plays when the
    /// playlist is empty.
    fn open_all(&mut self, targets: Vec<String>) {
        if targets.is_empty() {
            return;
        }
        self.orchestrator
            .set_auto_play_pending(self.playlist.is_empty());
        for target in &targets {
            self.open(target);
        }
    }

    /// Add a file, a folder or a URI to the playlist.
    pub fn open(&mut self, target: &str) {
        if target.contains("://") {
            self.add_uri(target.to_string());
            return;
        }
        let path = Path::new(target);
        if path.is_dir() {
            self.add_folder(path);
            return;
        }
        match path_to_uri(path) {
            Ok(uri) => self.add_uri(uri),
            Err(e) => warn!(target = %target, error = %e, "cannot open"),
        }
    }

    pub fn add_uri(&mut self, uri: String) {
        discovery::spawn_discover(
            Arc::clone(&self.discoverer),
            uri,
            self.poster(AppEvent::Discovery),
        );
    }

    pub fn add_folder(&mut self, folder: &Path) {
        discovery::spawn_folder(
            Arc::clone(&self.discoverer),
            folder.to_path_buf(),
            self.config.library.clone(),
            self.poster(AppEvent::Discovery),
        );
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Engine(e) => self.on_engine_event(e),
            AppEvent::Library(e) => self.on_library_event(e),
            AppEvent::Discovery(e) => self.on_discovery_event(e),
            AppEvent::Analysis(r) => self.on_analysis_result(r),
            AppEvent::Playlist(e) => self.on_playlist_event(e),
        }
    }

    /// Returns `true` when the command asks the app to quit.
    pub fn handle_control(&mut self, cmd: ControlCmd) -> bool {
        debug!(?cmd, "control command");
        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::Play => {
                self.resume();
            }
            ControlCmd::Pause => {
                self.pause();
            }
            ControlCmd::PlayPause => {
                self.play_pause();
            }
            ControlCmd::Stop => self.stop(),
            ControlCmd::Next => {
                self.next();
            }
            ControlCmd::Prev => {
                self.prev();
            }
        }
        false
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        if let EngineEvent::Loudness(levels) = &event {
            self.on_loudness(levels);
            return;
        }
        self.orchestrator.handle_event(&mut self.playlist, &event);
        self.apply_notices();
    }

    fn on_loudness(&mut self, levels: &[f64]) {
        if self.orchestrator.state() != PlayerState::Playing {
            return;
        }
        let Some(track) = self.playlist.current_mut() else {
            return;
        };
        match self.live.on_loudness(track, levels) {
            LiveUpdate::Nothing => {}
            LiveUpdate::Push(samples) => self.now_playing.set_waveform(&samples),
            LiveUpdate::Finished(samples) => {
                debug!(uri = %track.uri(), samples = samples.len(), "live waveform complete");
                if let Err(e) = self.analysis.cache().save(track.uri(), &samples) {
                    warn!(uri = %track.uri(), error = %e, "failed to save waveform cache");
                }
                self.now_playing.set_waveform(&samples);
            }
        }
    }

    fn on_library_event(&mut self, event: LibraryEvent) {
        match self.library.apply(event) {
            LibraryUpdate::NeedsScan => {
                info!("no usable library cache, scanning");
                self.rescan_library();
            }
            LibraryUpdate::Updated | LibraryUpdate::ScanFinished => {}
        }
    }

    fn on_discovery_event(&mut self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::Discovered(track) => {
                let was_empty = self.playlist.is_empty();
                let index = self.playlist.append(track);
                self.request_analysis(index);
                self.saver.touch(Instant::now());
                if was_empty && self.orchestrator.auto_play_pending() {
                    self.play_index(index);
                }
            }
            DiscoveryEvent::Failed { uri, error } => {
                debug!(uri = %uri, error = %error, "not added to playlist");
            }
        }
    }

    fn on_analysis_result(&mut self, result: AnalysisResult) {
        self.analysis.finish(&result.uri);
        let samples = match result.samples {
            Ok(s) if !s.is_empty() => s,
            Ok(_) => {
                debug!(uri = %result.uri, "analysis produced no samples");
                return;
            }
            Err(e) => {
                debug!(uri = %result.uri, error = %e, "no waveform");
                return;
            }
        };

        let mut stored = false;
        for track in self.playlist.iter_mut().filter(|t| t.uri() == result.uri) {
            stored |= track.set_waveform(samples.clone());
        }
        if !stored {
            return;
        }
        if !result.cached {
            if let Err(e) = self.analysis.cache().save(&result.uri, &samples) {
                warn!(uri = %result.uri, error = %e, "failed to save waveform cache");
            }
        }
        if self.now_playing.is_showing(&result.uri) {
            self.now_playing.set_waveform(&samples);
        }
    }

    fn on_playlist_event(&mut self, event: PlaylistEvent) {
        match event {
            PlaylistEvent::Loaded { path, tracks } => {
                match tracks {
                    Ok(tracks) => {
                        info!(path = %path.display(), tracks = tracks.len(), "playlist loaded");
                        self.stop();
                        self.playlist.replace_all(tracks);
                        self.start_repair();
                        if path != self.config.paths.playlist_file() {
                            self.saver.touch(Instant::now());
                        }
                    }
                    Err(e) => debug!(path = %path.display(), error = %e, "playlist not loaded"),
                }
                if let Some(targets) = self.pending_open.take() {
                    self.open_all(targets);
                }
            }
            PlaylistEvent::Repaired(fixed) => {
                let mut changed = false;
                for (uri, duration_ns) in fixed {
                    for track in self.playlist.iter_mut().filter(|t| t.uri() == uri) {
                        if track.duration_ns == 0 {
                            track.duration_ns = duration_ns;
                            changed = true;
                        }
                    }
                }
                if changed {
                    self.saver.touch(Instant::now());
                }
            }
        }
    }

    /// Re-read unknown durations in the background and queue analysis for
    /// every track still missing a waveform.
    fn start_repair(&mut self) {
        let uris: Vec<String> = self
            .playlist
            .tracks()
            .iter()
            .filter(|t| t.duration_ns == 0)
            .map(|t| t.uri().to_string())
            .collect();
        if !uris.is_empty() {
            playlist::spawn_repair(uris, Arc::clone(&self.tags), self.poster(AppEvent::Playlist));
        }
        for i in 0..self.playlist.len() {
            self.request_analysis(i);
        }
    }

    fn request_analysis(&mut self, index: usize) {
        let Some(track) = self.playlist.get_mut(index) else {
            return;
        };
        if self.analysis.request(track) == RequestOutcome::CacheHit
            && self.now_playing.is_showing(track.uri())
        {
            if let Some(w) = track.waveform() {
                self.now_playing.set_waveform(w.samples());
            }
        }
    }

    fn apply_notices(&mut self) {
        let now = Instant::now();
        for notice in self.orchestrator.drain_notices() {
            match notice {
                Notice::TrackChanged(uri) => {
                    self.live.reset();
                    for track in self.playlist.iter_mut() {
                        track.discard_partial_waveform();
                    }
                    self.now_playing.show_track(self.playlist.current());
                    if let Some(i) = self.playlist.current_index() {
                        self.request_analysis(i);
                    }
                    debug!(uri = ?uri, "current track changed");
                    self.control_dirty = true;
                }
                Notice::StatusChanged(_) => self.control_dirty = true,
                Notice::Seeked => {
                    self.live.reset();
                    if let Some(track) = self.playlist.current_mut() {
                        if track.discard_partial_waveform() {
                            self.now_playing.set_waveform(&[]);
                        }
                    }
                }
                Notice::Progress {
                    position_ns,
                    duration_ns,
                } => {
                    self.now_playing.set_progress(position_ns, duration_ns);
                    self.control_dirty = true;
                }
                Notice::Error(message) => {
                    let ttl = Duration::from_millis(self.config.playback.notification_ms);
                    self.now_playing.notify(message, now, ttl);
                }
                Notice::PlaylistDirty => self.saver.touch(now),
            }
        }
    }

    fn transport<R>(&mut self, op: impl FnOnce(&mut Orchestrator<E>, &mut Playlist) -> R) -> R {
        let r = op(&mut self.orchestrator, &mut self.playlist);
        self.apply_notices();
        r
    }

    pub fn play_index(&mut self, index: usize) -> bool {
        self.transport(|o, p| o.play_index(p, index))
    }

    pub fn play_pause(&mut self) -> bool {
        self.transport(|o, p| o.play_pause(p))
    }

    pub fn resume(&mut self) -> bool {
        self.transport(|o, p| o.resume(p))
    }

    pub fn pause(&mut self) -> bool {
        self.transport(|o, _| o.pause())
    }

    pub fn stop(&mut self) {
        self.transport(|o, p| o.stop(p))
    }

    pub fn next(&mut self) -> bool {
        self.transport(|o, p| o.next(p))
    }

    pub fn prev(&mut self) -> bool {
        self.transport(|o, p| o.prev(p))
    }

    pub fn seek_fraction(&mut self, fraction: f64) -> bool {
        self.transport(|o, p| o.seek_fraction(p, fraction))
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.playlist.select(index);
    }

    /// Remove one entry; removing the current track stops playback.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        let was_current = self.playlist.get(index).is_some_and(|t| t.is_current());
        let removed = self.playlist.remove(index)?;
        if was_current {
            self.stop();
        }
        self.saver.touch(Instant::now());
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.stop();
        self.playlist.clear();
        self.saver.touch(Instant::now());
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let moved = self.playlist.move_item(from, to);
        if moved {
            self.saver.touch(Instant::now());
        }
        moved
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        playlist::save_to(path, self.playlist.tracks())
    }

    /// Replace the playlist with the document at `path`, in the background.
    pub fn load_from(&self, path: &Path) {
        playlist::spawn_load(
            path.to_path_buf(),
            self.analysis.cache().clone(),
            self.poster(AppEvent::Playlist),
        );
    }

    fn save_now(&mut self) {
        let path = self.config.paths.playlist_file();
        if let Err(e) = playlist::save_to(&path, self.playlist.tracks()) {
            warn!(path = %path.display(), error = %e, "failed to save playlist");
        }
    }

    pub fn rescan_library(&mut self) -> bool {
        let root = self.settings.get().library_path.clone();
        let post = self.poster(AppEvent::Library);
        self.library.start_scan(&root, post)
    }

    /// Persist a new library root and rescan it.
    pub fn set_library_path(&mut self, path: PathBuf) -> bool {
        self.settings.update(|s| s.library_path = path);
        self.rescan_library()
    }

    /// Replace playback with the tracks of album `index`, starting at its
    /// first track. The tracks are appended to the playlist.
    pub fn play_album(&mut self, index: usize) -> bool {
        let first = self.playlist.len();
        if self.enqueue_album(index) == 0 {
            return false;
        }
        self.stop();
        self.orchestrator.set_auto_play_pending(true);
        self.play_index(first)
    }

    /// Append the tracks of album `index`. Returns how many were added.
    pub fn enqueue_album(&mut self, index: usize) -> usize {
        let Some(album) = self.library.albums().get(index).cloned() else {
            return 0;
        };
        let tracks = self.library.get_album_tracks(&album);
        let added = tracks.len();
        let first = self.playlist.len();
        self.playlist.extend(tracks);
        for i in first..self.playlist.len() {
            self.request_analysis(i);
        }
        if added > 0 {
            self.saver.touch(Instant::now());
        }
        info!(album = %album.title, tracks = added, "album enqueued");
        added
    }

    pub fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        self.settings.update(change);
        self.orchestrator
            .set_flags(PlaybackFlags::from(self.settings.get()));
    }

    pub fn set_auto_play(&mut self, on: bool) {
        self.update_settings(|s| s.auto_play = on);
    }

    pub fn set_repeat(&mut self, on: bool) {
        self.update_settings(|s| s.repeat = on);
    }

    pub fn set_loop_all(&mut self, on: bool) {
        self.update_settings(|s| s.loop_all = on);
    }

    pub fn set_clear_on_start(&mut self, on: bool) {
        self.update_settings(|s| s.clear_on_start = on);
    }

    pub fn set_dark_mode(&mut self, on: bool) {
        self.update_settings(|s| s.dark_mode = on);
    }

    /// Timers: progress poll, debounced save, notification expiry.
    pub fn tick(&mut self, now: Instant) {
        self.orchestrator.tick(&mut self.playlist, now);
        self.apply_notices();
        if self.saver.fire(now) {
            self.save_now();
        }
        self.now_playing.expire(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.orchestrator.next_deadline(),
            self.saver.deadline(),
            self.now_playing.notification_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn control_snapshot(&self) -> ControlSnapshot {
        let metadata = self.playlist.current_index().and_then(|index| {
            let t = self.playlist.get(index)?;
            let length_ns = self
                .orchestrator
                .duration_ns()
                .or((t.duration_ns > 0).then_some(t.duration_ns));
            Some(TrackMetadata {
                index,
                uri: t.uri().to_string(),
                title: t.title.clone(),
                artist: t.artist.clone(),
                album: t.album.clone(),
                length_us: length_ns.map(|ns| ns / 1_000),
                art: t.art().cloned(),
            })
        });
        ControlSnapshot {
            status: PlaybackStatus::from(self.orchestrator.state()),
            metadata,
            position_us: self.now_playing.position_ns / 1_000,
        }
    }

    /// Whether control surfaces need a fresh snapshot since the last call.
    pub fn take_control_dirty(&mut self) -> bool {
        std::mem::take(&mut self.control_dirty)
    }

    /// Flush the playlist and release the engine's stream.
    pub fn shutdown(&mut self) {
        self.saver.take_pending();
        self.save_now();
        if let Err(e) = self
            .orchestrator
            .engine_mut()
            .set_state(EngineState::Null)
        {
            warn!(error = %e, "engine reset on shutdown failed");
        }
    }
}
