use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::engine::{ProbeError, Prober};
use crate::library::{ArtResolver, TagInfo, Track, fallback_title, uri_to_path};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("unsupported URI: {0}")]
    UnsupportedUri(String),

    #[error("no decoder available for {0}")]
    MissingCodec(String),

    #[error("discovery of {uri} failed: {reason}")]
    Failed { uri: String, reason: String },
}

impl DiscoveryError {
    fn from_probe(uri: &str, err: ProbeError) -> Self {
        match err {
            ProbeError::UnsupportedUri(_) => DiscoveryError::UnsupportedUri(uri.to_string()),
            ProbeError::MissingCodec(_) => DiscoveryError::MissingCodec(uri.to_string()),
            ProbeError::Other(reason) => DiscoveryError::Failed {
                uri: uri.to_string(),
                reason,
            },
        }
    }
}

/// Turns a URI into a populated `Track`.
///
/// The prober supplies the duration and generic tags; the tag reader's
/// non-empty fields win over the prober's.
pub struct Discoverer {
    prober: Arc<dyn Prober>,
    art: Arc<ArtResolver>,
}

impl Discoverer {
    pub fn new(prober: Arc<dyn Prober>, art: Arc<ArtResolver>) -> Self {
        Self { prober, art }
    }

    pub fn art(&self) -> &Arc<ArtResolver> {
        &self.art
    }

    pub fn discover(&self, uri: &str) -> Result<Track, DiscoveryError> {
        let probe = self
            .prober
            .probe(uri)
            .map_err(|e| DiscoveryError::from_probe(uri, e))?;

        let path = uri_to_path(uri).ok();
        let tags = path
            .as_deref()
            .map(|p| self.read_tags(p))
            .unwrap_or_default();

        let title = tags.title.or(probe.title).or_else(|| path.as_deref().map(fallback_title));
        let artist = tags.artist.or(probe.artist);
        let album = tags.album.or(probe.album);
        let duration_ns = if probe.duration_ns > 0 {
            probe.duration_ns
        } else {
            tags.duration.map(crate::engine::duration_to_ns).unwrap_or(0)
        };

        let mut track = Track::new(uri, title, artist, album, duration_ns);
        if let Some(art) = path.as_deref().and_then(|p| self.art.resolve(p)) {
            track.set_art(art);
        }
        debug!(uri = %uri, title = %track.title, duration_ns, art = track.art().is_some(), "discovered");
        Ok(track)
    }

    fn read_tags(&self, path: &Path) -> TagInfo {
        match self.art.tag_reader().read_tags(path) {
            Ok(t) => t,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "tags unreadable, using fallbacks");
                TagInfo::default()
            }
        }
    }
}
