use std::time::{Duration, Instant};

use crate::analysis::render_bars;
use crate::library::{ArtBytes, Track};

/// Waveform bars shown for the current track.
pub const DEFAULT_BARS: usize = 120;

/// `M:SS`, or `--:--` while unknown.
pub fn format_time(ns: Option<u64>) -> String {
    match ns {
        Some(ns) => {
            let secs = ns / 1_000_000_000;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "--:--".to_string(),
    }
}

#[derive(Debug, Clone)]
struct Notification {
    message: String,
    expires_at: Instant,
}

/// Display state for the current track.
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub uri: Option<String>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub art: Option<ArtBytes>,
    pub bars: Vec<f32>,
    pub position_ns: u64,
    pub duration_ns: Option<u64>,
    bar_count: usize,
    notification: Option<Notification>,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new(DEFAULT_BARS)
    }
}

impl NowPlaying {
    pub fn new(bar_count: usize) -> Self {
        Self {
            uri: None,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            art: None,
            bars: vec![0.0; bar_count],
            position_ns: 0,
            duration_ns: None,
            bar_count,
            notification: None,
        }
    }

    /// Switch to `track` (or to nothing). Progress restarts from zero.
    pub fn show_track(&mut self, track: Option<&Track>) {
        let Some(track) = track else {
            let notification = self.notification.take();
            *self = Self::new(self.bar_count);
            self.notification = notification;
            return;
        };
        self.uri = Some(track.uri().to_string());
        self.title = track.title.clone();
        self.artist = track.artist.clone();
        self.album = track.album.clone();
        self.art = track.art().cloned();
        self.position_ns = 0;
        self.duration_ns = (track.duration_ns > 0).then_some(track.duration_ns);
        let raw = track.waveform().map(|w| w.samples()).unwrap_or(&[]);
        self.set_waveform(raw);
    }

    pub fn is_showing(&self, uri: &str) -> bool {
        self.uri.as_deref() == Some(uri)
    }

    pub fn set_waveform(&mut self, raw: &[f32]) {
        self.bars = render_bars(raw, self.bar_count);
    }

    pub fn set_progress(&mut self, position_ns: u64, duration_ns: Option<u64>) {
        self.position_ns = position_ns;
        if let Some(d) = duration_ns.filter(|d| *d > 0) {
            self.duration_ns = Some(d);
        }
    }

    /// Played share of the track in `[0, 1]`; 0 while the duration is unknown.
    pub fn fraction(&self) -> f64 {
        match self.duration_ns {
            Some(d) if d > 0 => (self.position_ns as f64 / d as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn position_label(&self) -> String {
        if self.uri.is_none() {
            return format_time(None);
        }
        format_time(Some(self.position_ns))
    }

    pub fn remaining_label(&self) -> String {
        match self.duration_ns {
            Some(d) if self.uri.is_some() => {
                format!("-{}", format_time(Some(d.saturating_sub(self.position_ns))))
            }
            _ => format_time(None),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant, ttl: Duration) {
        self.notification = Some(Notification {
            message: message.into(),
            expires_at: now + ttl,
        });
    }

    pub fn notification(&self, now: Instant) -> Option<&str> {
        self.notification
            .as_ref()
            .filter(|n| now < n.expires_at)
            .map(|n| n.message.as_str())
    }

    pub fn notification_deadline(&self) -> Option<Instant> {
        self.notification.as_ref().map(|n| n.expires_at)
    }

    /// Drop an expired notification. Returns `true` when one was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.notification.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notification = None;
            return true;
        }
        false
    }
}
