use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::PlaybackSettings;
use crate::engine::{EngineEvent, EngineState, PlaybackEngine, SeekFlags};
use crate::playlist::Playlist;

use super::state::{Notice, PlaybackFlags, PlayerState};

/// Upper bound on how long a track switch blocks further `play` calls when
/// the engine never confirms.
const SWITCH_TIMEOUT: Duration = Duration::from_secs(5);

/// The transport state machine.
///
/// Owns the engine and the notion of "current track". Every method runs on
/// the main loop; side effects for the rest of the app are queued as
/// `Notice`s and collected with `drain_notices`.
pub struct Orchestrator<E: PlaybackEngine> {
    engine: E,
    state: PlayerState,
    current: Option<String>,
    duration_ns: Option<u64>,
    flags: PlaybackFlags,
    auto_play_pending: bool,
    switching_since: Option<Instant>,
    progress_due: Option<Instant>,
    progress_interval: Duration,
    prev_threshold_ns: u64,
    notices: Vec<Notice>,
}

impl<E: PlaybackEngine> Orchestrator<E> {
    pub fn new(engine: E, flags: PlaybackFlags, settings: &PlaybackSettings) -> Self {
        Self {
            engine,
            state: PlayerState::Idle,
            current: None,
            duration_ns: None,
            flags,
            auto_play_pending: false,
            switching_since: None,
            progress_due: None,
            progress_interval: Duration::from_millis(settings.progress_interval_ms.max(1)),
            prev_threshold_ns: settings.prev_restart_threshold_ms.saturating_mul(1_000_000),
            notices: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn duration_ns(&self) -> Option<u64> {
        self.duration_ns
    }

    #[cfg(test)]
    pub(crate) fn flags(&self) -> PlaybackFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: PlaybackFlags) {
        self.flags = flags;
    }

    pub fn auto_play_pending(&self) -> bool {
        self.auto_play_pending
    }

    pub fn set_auto_play_pending(&mut self, pending: bool) {
        self.auto_play_pending = pending;
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Engine position while a track is loaded.
    pub fn position_ns(&self) -> Option<u64> {
        if self.state.is_active() {
            self.engine.query_position()
        } else {
            None
        }
    }

    /// When the main loop should next call `tick`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.progress_due
    }

    fn is_switching(&self, now: Instant) -> bool {
        self.switching_since
            .is_some_and(|since| now.duration_since(since) < SWITCH_TIMEOUT)
    }

    fn set_state(&mut self, new: PlayerState) {
        if self.state != new {
            debug!(old = %self.state, new = %new, "player state");
            self.state = new;
            self.notices.push(Notice::StatusChanged(new));
        }
    }

    fn clear_current(&mut self, playlist: &mut Playlist) {
        playlist.set_current(None);
        if self.current.take().is_some() {
            self.notices.push(Notice::TrackChanged(None));
        }
        self.duration_ns = None;
        self.switching_since = None;
        self.progress_due = None;
    }

    fn push_progress(&mut self, position_ns: u64) {
        self.notices.push(Notice::Progress {
            position_ns,
            duration_ns: self.duration_ns,
        });
    }

    /// Load and start `uri`. Ignored while a previous switch is still
    /// waiting for the engine.
    pub fn play(&mut self, playlist: &mut Playlist, uri: &str) -> bool {
        let now = Instant::now();
        if self.is_switching(now) {
            warn!(uri = %uri, "play ignored: track switch already in progress");
            return false;
        }
        self.switching_since = Some(now);

        // Reset first so two URI changes never overlap in the engine.
        if let Err(e) = self.engine.set_state(EngineState::Null) {
            warn!(error = %e, "engine reset failed");
        }
        self.engine.set_uri(uri);

        if playlist.set_current(Some(uri)).is_none() {
            debug!(uri = %uri, "playing a URI that is not in the playlist");
        }
        self.current = Some(uri.to_string());
        self.duration_ns = None;
        self.progress_due = None;
        self.auto_play_pending = false;
        self.set_state(PlayerState::Loading);
        self.notices.push(Notice::TrackChanged(self.current.clone()));
        info!(uri = %uri, "play");

        if let Err(e) = self.engine.set_state(EngineState::Playing) {
            self.fail(playlist, e.to_string());
            return false;
        }
        true
    }

    /// Select `index` and play it.
    pub fn play_index(&mut self, playlist: &mut Playlist, index: usize) -> bool {
        if self.is_switching(Instant::now()) {
            warn!(index, "play ignored: track switch already in progress");
            return false;
        }
        let Some(uri) = playlist.get(index).map(|t| t.uri().to_string()) else {
            return false;
        };
        playlist.select(Some(index));
        self.play(playlist, &uri)
    }

    pub fn next(&mut self, playlist: &mut Playlist) -> bool {
        let n = playlist.len();
        if n == 0 {
            return false;
        }
        let target = match playlist.selected() {
            Some(i) if i + 1 < n => Some(i + 1),
            Some(_) => self.flags.loop_all.then_some(0),
            None => Some(0),
        };
        match target {
            Some(i) => self.play_index(playlist, i),
            None => {
                info!("end of playlist");
                false
            }
        }
    }

    /// Restart the current track when it has played past the threshold,
    /// otherwise move to the previous one.
    pub fn prev(&mut self, playlist: &mut Playlist) -> bool {
        if self.state.is_active() {
            if let Some(pos) = self.engine.query_position() {
                if pos > self.prev_threshold_ns {
                    debug!(position_ns = pos, "prev: restarting current track");
                    return self.seek_to(playlist, 0);
                }
            }
        }

        let n = playlist.len();
        if n == 0 {
            return false;
        }
        let target = match playlist.selected() {
            Some(i) if i > 0 => Some(i - 1),
            Some(_) => self.flags.loop_all.then_some(n - 1),
            None => Some(n - 1),
        };
        match target {
            Some(i) => self.play_index(playlist, i),
            None => false,
        }
    }

    /// Toggle between playing and paused; from a stopped state start the
    /// selected track.
    pub fn play_pause(&mut self, playlist: &mut Playlist) -> bool {
        match self.state {
            PlayerState::Playing => self.pause(),
            _ => self.resume(playlist),
        }
    }

    pub fn resume(&mut self, playlist: &mut Playlist) -> bool {
        match self.state {
            PlayerState::Paused => self.request(playlist, EngineState::Playing),
            PlayerState::Idle | PlayerState::Stopped => {
                let index = playlist.selected().unwrap_or(0);
                self.play_index(playlist, index)
            }
            PlayerState::Playing | PlayerState::Loading => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != PlayerState::Playing {
            return false;
        }
        match self.engine.set_state(EngineState::Paused) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "pause failed");
                false
            }
        }
    }

    pub fn stop(&mut self, playlist: &mut Playlist) {
        if self.current.is_none() && !self.state.is_active() && self.state != PlayerState::Loading {
            return;
        }
        if let Err(e) = self.engine.set_state(EngineState::Null) {
            warn!(error = %e, "stop failed");
        }
        self.clear_current(playlist);
        self.set_state(PlayerState::Stopped);
    }

    /// Seek to `fraction` of the known duration. No-op until the duration
    /// is known.
    pub fn seek_fraction(&mut self, playlist: &mut Playlist, fraction: f64) -> bool {
        let Some(duration) = self.duration_ns.filter(|d| *d > 0) else {
            debug!("seek ignored: duration unknown");
            return false;
        };
        let target = (fraction.clamp(0.0, 1.0) * duration as f64) as u64;
        self.seek_to(playlist, target)
    }

    fn seek_to(&mut self, playlist: &mut Playlist, position_ns: u64) -> bool {
        match self.engine.seek(position_ns, SeekFlags::FLUSH) {
            Ok(()) => {
                self.notices.push(Notice::Seeked);
                self.push_progress(position_ns);
                true
            }
            Err(e) => {
                self.fail(playlist, e.to_string());
                false
            }
        }
    }

    fn request(&mut self, playlist: &mut Playlist, state: EngineState) -> bool {
        match self.engine.set_state(state) {
            Ok(()) => true,
            Err(e) => {
                self.fail(playlist, e.to_string());
                false
            }
        }
    }

    fn fail(&mut self, playlist: &mut Playlist, message: String) {
        error!(error = %message, "playback error");
        if let Err(e) = self.engine.set_state(EngineState::Null) {
            debug!(error = %e, "engine reset after error failed");
        }
        self.clear_current(playlist);
        self.set_state(PlayerState::Stopped);
        self.notices.push(Notice::Error(message));
    }

    fn refresh_duration(&mut self, playlist: &mut Playlist) {
        let Some(d) = self.engine.query_duration().filter(|d| *d > 0) else {
            return;
        };
        self.duration_ns = Some(d);
        if let Some(track) = playlist.current_mut() {
            if track.duration_ns == 0 {
                track.duration_ns = d;
                self.notices.push(Notice::PlaylistDirty);
            }
        }
    }

    fn on_eos(&mut self, playlist: &mut Playlist) {
        if self.flags.repeat && self.current.is_some() {
            debug!("end of stream: repeating current track");
            if self.seek_to(playlist, 0) {
                self.request(playlist, EngineState::Playing);
            }
            return;
        }

        info!("end of stream");
        if let Err(e) = self.engine.set_state(EngineState::Null) {
            debug!(error = %e, "engine reset at end of stream failed");
        }
        self.clear_current(playlist);
        self.set_state(PlayerState::Stopped);
        if self.flags.auto_play {
            self.next(playlist);
        }
    }

    pub fn handle_event(&mut self, playlist: &mut Playlist, event: &EngineEvent) {
        match event {
            EngineEvent::StateChanged { new, .. } => match new {
                EngineState::Playing => {
                    self.switching_since = None;
                    self.set_state(PlayerState::Playing);
                    if self.progress_due.is_none() {
                        self.progress_due = Some(Instant::now());
                    }
                }
                EngineState::Paused => {
                    self.switching_since = None;
                    self.set_state(PlayerState::Paused);
                    self.progress_due = None;
                }
                EngineState::Null => {
                    // Our own reset during a switch.
                    if self.state == PlayerState::Loading {
                        return;
                    }
                    if self.state.is_active() {
                        self.set_state(PlayerState::Stopped);
                    }
                    self.progress_due = None;
                }
            },
            EngineEvent::DurationChanged => {
                self.refresh_duration(playlist);
                let pos = self.engine.query_position().unwrap_or(0);
                self.push_progress(pos);
            }
            EngineEvent::Eos => {
                if self.state == PlayerState::Loading {
                    debug!("stale end of stream ignored");
                    return;
                }
                if self.current.is_some() {
                    self.on_eos(playlist);
                }
            }
            EngineEvent::Error(message) => self.fail(playlist, message.clone()),
            EngineEvent::Loudness(_) => {}
        }
    }

    /// Periodic progress poll, active while playing.
    pub fn tick(&mut self, playlist: &mut Playlist, now: Instant) {
        let Some(due) = self.progress_due else {
            return;
        };
        if now < due {
            return;
        }
        if self.state != PlayerState::Playing {
            self.progress_due = None;
            return;
        }
        if self.duration_ns.is_none() {
            self.refresh_duration(playlist);
        }
        let pos = self.engine.query_position().unwrap_or(0);
        self.push_progress(pos);
        self.progress_due = Some(now + self.progress_interval);
    }
}
