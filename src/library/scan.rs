use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::art::ArtResolver;
use super::model::{Album, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

pub(crate) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn walker(root: &Path, settings: &LibrarySettings) -> impl Iterator<Item = walkdir::DirEntry> {
    let include_hidden = settings.include_hidden;
    WalkDir::new(root)
        .follow_links(settings.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
}

/// Every audio file below `root`, recursively.
pub fn audio_files_under(root: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    walker(root, settings)
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_audio_file(p, settings))
        .collect()
}

/// Audio files directly inside `dir`, sorted by name.
pub fn audio_files_in(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && (settings.include_hidden || !is_hidden(p))
                && is_audio_file(p, settings)
        })
        .collect();
    files.sort();
    files
}

/// Group the folders below `root` into albums.
///
/// One representative file per folder decides the `(artist, album)` key;
/// the first folder seen for a key wins. `on_partial` receives the album
/// list every `settings.partial_batch` new albums.
pub fn scan_albums(
    root: &Path,
    settings: &LibrarySettings,
    art: &ArtResolver,
    mut on_partial: impl FnMut(&[Album]),
) -> Vec<Album> {
    let mut albums: Vec<Album> = Vec::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for entry in walker(root, settings) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        let files = audio_files_in(dir, settings);
        let Some(first) = files.first() else {
            continue;
        };

        let tags = match art.tag_reader().read_tags(first) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %first.display(), error = %e, "skipping folder with unreadable tags");
                continue;
            }
        };
        let artist = tags.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let title = tags.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        let key = (artist.clone(), title.clone());
        if seen.contains_key(&key) {
            continue;
        }

        let album_art = art.folder_art(dir).or_else(|| {
            files
                .iter()
                .take(settings.art_probe_files.max(1))
                .find_map(|f| art.embedded_art(f))
        });

        debug!(artist = %artist, album = %title, folder = %dir.display(), "album found");
        seen.insert(key, albums.len());
        albums.push(Album {
            title,
            artist,
            folder: dir.to_path_buf(),
            art: album_art,
        });

        if albums.len() % settings.partial_batch.max(1) == 0 {
            on_partial(&albums);
        }
    }

    albums
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.m4a"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn audio_files_under_recurses_and_skips_hidden() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let hidden = dir.path().join(".hidden");
        fs::create_dir_all(&sub).unwrap();
        fs::create_dir_all(&hidden).unwrap();
        fs::write(dir.path().join("root.mp3"), b"x").unwrap();
        fs::write(sub.join("child.flac"), b"x").unwrap();
        fs::write(hidden.join("secret.mp3"), b"x").unwrap();
        fs::write(dir.path().join(".dot.mp3"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = audio_files_under(dir.path(), &LibrarySettings::default());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"root.mp3".to_string()));
        assert!(names.contains(&"child.flac".to_string()));
    }

    #[test]
    fn audio_files_in_is_not_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a.ogg"), b"x").unwrap();
        fs::write(dir.path().join("nested").join("c.mp3"), b"x").unwrap();

        let files = audio_files_in(dir.path(), &LibrarySettings::default());
        assert_eq!(
            files,
            vec![dir.path().join("a.ogg"), dir.path().join("b.mp3")]
        );
    }
}
