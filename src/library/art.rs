use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::model::ArtBytes;
use super::tags::TagReader;

/// Base names checked first, in this order.
const COVER_BASES: [&str; 5] = ["cover", "folder", "album", "front", "art"];
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Resolves cover art for audio files: embedded picture first, then an
/// image file in the same directory.
///
/// Directory lookups are cached, including misses, so an album folder is
/// listed at most once for the lifetime of the resolver.
pub struct ArtResolver {
    tags: Arc<dyn TagReader>,
    folder_cache: Mutex<HashMap<PathBuf, Option<ArtBytes>>>,
}

impl ArtResolver {
    pub fn new(tags: Arc<dyn TagReader>) -> Self {
        Self {
            tags,
            folder_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn tag_reader(&self) -> &Arc<dyn TagReader> {
        &self.tags
    }

    /// Embedded art if present, otherwise folder art.
    pub fn resolve(&self, audio_path: &Path) -> Option<ArtBytes> {
        self.embedded_art(audio_path)
            .or_else(|| audio_path.parent().and_then(|dir| self.folder_art(dir)))
    }

    pub fn embedded_art(&self, audio_path: &Path) -> Option<ArtBytes> {
        self.tags
            .read_embedded_art(audio_path)
            .map(ArtBytes::from)
    }

    /// Image file art for `dir`, served from the per-directory cache after
    /// the first lookup.
    pub fn folder_art(&self, dir: &Path) -> Option<ArtBytes> {
        if let Ok(cache) = self.folder_cache.lock() {
            if let Some(hit) = cache.get(dir) {
                return hit.clone();
            }
        }

        let found = find_folder_image(dir).and_then(|p| match fs::read(&p) {
            Ok(bytes) => Some(ArtBytes::from(bytes)),
            Err(e) => {
                warn!(path = %p.display(), error = %e, "failed to read folder art");
                None
            }
        });

        if let Ok(mut cache) = self.folder_cache.lock() {
            cache.insert(dir.to_path_buf(), found.clone());
        }
        found
    }

    #[cfg(test)]
    pub(crate) fn cached_dirs(&self) -> usize {
        self.folder_cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

/// Pick the image to use for a directory: a common cover name wins, any
/// other image is the fallback.
fn find_folder_image(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list directory for art");
            return None;
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    images.sort();

    for base in COVER_BASES {
        let hit = images.iter().find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(base))
                .unwrap_or(false)
        });
        if let Some(p) = hit {
            return Some(p.clone());
        }
    }

    images.into_iter().next()
}
