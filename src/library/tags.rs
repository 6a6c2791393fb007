//! Tag reading behind a small trait so discovery and scanning can be driven
//! by a fake in tests.

use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use lofty::tag::{Tag, TagType};
use tracing::debug;

use crate::error::{Error, Result};

/// Fields pulled from a file's tags. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub duration: Option<Duration>,
}

impl TagInfo {
    pub fn duration_ns(&self) -> u64 {
        self.duration
            .map(|d| d.as_nanos().min(u64::MAX as u128) as u64)
            .unwrap_or(0)
    }
}

pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<TagInfo>;

    /// First embedded picture, if the container carries one.
    fn read_embedded_art(&self, path: &Path) -> Option<Vec<u8>>;
}

/// `TagReader` backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

/// Picture sources in priority order: ID3 picture frame, MP4 cover atom,
/// Vorbis/FLAC picture block.
const ART_TAG_PRIORITY: [TagType; 3] = [TagType::Id3v2, TagType::Mp4Ilst, TagType::VorbisComments];

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagInfo> {
        let tagged = lofty::read_from_path(path).map_err(|e| Error::Tag {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut info = TagInfo {
            duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
            ..TagInfo::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            info.title = clean(tag.title().as_deref());
            info.artist = clean(tag.artist().as_deref());
            info.album = clean(tag.album().as_deref());
            info.track_number = tag.track();
        }

        Ok(info)
    }

    fn read_embedded_art(&self, path: &Path) -> Option<Vec<u8>> {
        let tagged = match lofty::read_from_path(path) {
            Ok(t) => t,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable tags for embedded art");
                return None;
            }
        };

        for kind in ART_TAG_PRIORITY {
            if let Some(data) = tagged.tag(kind).and_then(first_picture) {
                return Some(data);
            }
        }
        tagged.tags().iter().find_map(first_picture)
    }
}

fn first_picture(tag: &Tag) -> Option<Vec<u8>> {
    tag.pictures()
        .iter()
        .map(|p| p.data())
        .find(|d| !d.is_empty())
        .map(|d| d.to_vec())
}

fn clean(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Title used when tags carry none: the file name without its extension.
pub fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("UNKNOWN")
        .to_string()
}
