use std::sync::Arc;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Opaque image bytes (cover art). Cheap to clone, never mutated.
pub type ArtBytes = Arc<[u8]>;

/// Loudness samples of one track, linear amplitude in `[0, 1]`.
///
/// Samples are appended while the waveform is partial (live accumulation
/// from the playback stream); once `complete` is set the data is final.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    complete: bool,
}

impl Waveform {
    pub fn complete(samples: Vec<f32>) -> Self {
        Self {
            samples,
            complete: true,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append one live sample unless finalized or `cap` is reached.
    /// Returns whether the sample was stored.
    pub fn push_live(&mut self, sample: f32, cap: usize) -> bool {
        if self.complete || self.samples.len() >= cap {
            return false;
        }
        self.samples.push(sample.clamp(0.0, 1.0));
        true
    }

    pub fn finalize(&mut self) {
        self.complete = true;
    }
}

/// One playable item. Identity is the source URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    uri: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Nanoseconds; 0 means unknown.
    pub duration_ns: u64,
    art: Option<ArtBytes>,
    waveform: Option<Waveform>,
    is_current: bool,
}

impl Track {
    /// Build a track, substituting the "Unknown …" defaults for empty fields.
    pub fn new(
        uri: impl Into<String>,
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
        duration_ns: u64,
    ) -> Self {
        Self {
            uri: uri.into(),
            title: non_empty_or(title, UNKNOWN_TITLE),
            artist: non_empty_or(artist, UNKNOWN_ARTIST),
            album: non_empty_or(album, UNKNOWN_ALBUM),
            duration_ns,
            art: None,
            waveform: None,
            is_current: false,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn art(&self) -> Option<&ArtBytes> {
        self.art.as_ref()
    }

    /// Attach cover art. Art is immutable once set; later calls are ignored.
    pub fn set_art(&mut self, art: ArtBytes) -> bool {
        if self.art.is_some() {
            return false;
        }
        self.art = Some(art);
        true
    }

    pub fn waveform(&self) -> Option<&Waveform> {
        self.waveform.as_ref()
    }

    /// True when the track carries final, non-empty waveform data.
    pub fn has_waveform(&self) -> bool {
        self.waveform
            .as_ref()
            .map(|w| w.is_complete() && !w.is_empty())
            .unwrap_or(false)
    }

    /// Install finished waveform data. Never overwrites existing final data.
    pub fn set_waveform(&mut self, samples: Vec<f32>) -> bool {
        if self.has_waveform() || samples.is_empty() {
            return false;
        }
        self.waveform = Some(Waveform::complete(samples));
        true
    }

    /// Drop live samples that were never finalized. Returns `true` when
    /// something was dropped.
    pub fn discard_partial_waveform(&mut self) -> bool {
        if self.waveform.as_ref().is_some_and(|w| !w.is_complete()) {
            self.waveform = None;
            return true;
        }
        false
    }

    /// Partial waveform used for live accumulation, created on demand.
    pub fn live_waveform_mut(&mut self) -> &mut Waveform {
        self.waveform.get_or_insert_with(Waveform::default)
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub(crate) fn set_current(&mut self, current: bool) {
        self.is_current = current;
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// A library album, keyed by `(artist, title)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub title: String,
    pub artist: String,
    /// Folder the album's tracks live in.
    pub folder: std::path::PathBuf,
    pub art: Option<ArtBytes>,
}

impl Album {
    pub fn key(&self) -> (String, String) {
        (self.artist.clone(), self.title.clone())
    }
}
