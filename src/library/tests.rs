use super::*;
use crate::cache::LibraryCache;
use crate::config::LibrarySettings;
use crate::testing::{FakeTagReader, tags};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::tempdir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

fn index_with(reader: FakeTagReader, cache_path: &Path) -> LibraryIndex {
    LibraryIndex::new(
        LibraryCache::new(cache_path),
        Arc::new(ArtResolver::new(Arc::new(reader))),
        LibrarySettings::default(),
    )
}

#[test]
fn track_new_substitutes_unknown_defaults() {
    let t = Track::new("file:///a.mp3", None, Some("  ".into()), Some("X".into()), 0);
    assert_eq!(t.title, UNKNOWN_TITLE);
    assert_eq!(t.artist, UNKNOWN_ARTIST);
    assert_eq!(t.album, "X");
    assert!(!t.is_current());
    assert!(!t.has_waveform());
}

#[test]
fn track_art_and_waveform_are_write_once() {
    let mut t = Track::new("file:///a.mp3", Some("A".into()), None, None, 0);
    assert!(t.set_art(ArtBytes::from(vec![1u8])));
    assert!(!t.set_art(ArtBytes::from(vec![2u8])));
    assert_eq!(t.art().unwrap().as_ref(), &[1u8]);

    assert!(!t.set_waveform(vec![]));
    assert!(t.set_waveform(vec![0.5, 0.25]));
    assert!(!t.set_waveform(vec![1.0]));
    assert_eq!(t.waveform().unwrap().samples(), &[0.5, 0.25]);
}

#[test]
fn live_waveform_respects_cap_and_finalize() {
    let mut t = Track::new("file:///a.mp3", None, None, None, 0);
    let w = t.live_waveform_mut();
    assert!(w.push_live(2.0, 2));
    assert!(w.push_live(0.1, 2));
    assert!(!w.push_live(0.1, 2));
    assert_eq!(w.samples(), &[1.0, 0.1]);
    assert!(!t.has_waveform());

    t.live_waveform_mut().finalize();
    assert!(t.has_waveform());
    assert!(!t.live_waveform_mut().push_live(0.3, 10));
}

#[test]
fn fallback_title_uses_file_stem() {
    assert_eq!(fallback_title(Path::new("/m/01 Intro.flac")), "01 Intro");
    assert_eq!(fallback_title(Path::new("/")), "UNKNOWN");
}

#[test]
fn folder_art_prefers_cover_names_and_caches_misses() {
    let dir = tempdir().unwrap();
    let with_art = dir.path().join("a");
    let without = dir.path().join("b");
    fs::create_dir_all(&with_art).unwrap();
    fs::create_dir_all(&without).unwrap();
    fs::write(with_art.join("back.jpg"), b"back").unwrap();
    fs::write(with_art.join("Cover.PNG"), b"cover").unwrap();

    let resolver = ArtResolver::new(Arc::new(FakeTagReader::new()));
    assert_eq!(resolver.folder_art(&with_art).unwrap().as_ref(), b"cover");
    assert!(resolver.folder_art(&without).is_none());
    assert_eq!(resolver.cached_dirs(), 2);

    // cached: deleting the file doesn't change the answer
    fs::remove_file(with_art.join("Cover.PNG")).unwrap();
    assert_eq!(resolver.folder_art(&with_art).unwrap().as_ref(), b"cover");
}

#[test]
fn resolve_prefers_embedded_over_folder_art() {
    let dir = tempdir().unwrap();
    let song = dir.path().join("song.mp3");
    touch(&song);
    fs::write(dir.path().join("folder.jpg"), b"folder").unwrap();

    let resolver = ArtResolver::new(Arc::new(FakeTagReader::new().with_art("song.mp3", b"emb")));
    assert_eq!(resolver.resolve(&song).unwrap().as_ref(), b"emb");

    let other = dir.path().join("other.mp3");
    touch(&other);
    assert_eq!(resolver.resolve(&other).unwrap().as_ref(), b"folder");
}

#[test]
fn scan_groups_two_albums_and_skips_unreadable_folders() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("A/X/01.mp3"));
    touch(&root.join("A/X/02.mp3"));
    touch(&root.join("A/Y/01.flac"));
    touch(&root.join("Broken/bad.mp3"));
    touch(&root.join("A/X-dup/x.mp3"));
    fs::write(root.join("A/X/cover.jpg"), b"xart").unwrap();

    let reader = FakeTagReader::new()
        .with_tags("01.mp3", tags("One", "A", "X", Some(1)))
        .with_tags("02.mp3", tags("Two", "A", "X", Some(2)))
        .with_tags("01.flac", tags("Uno", "A", "Y", Some(1)))
        .with_tags("x.mp3", tags("Again", "A", "X", None))
        .with_art("01.flac", b"yart")
        .unreadable("bad.mp3");
    let art = ArtResolver::new(Arc::new(reader));

    let mut partials = 0;
    let settings = LibrarySettings {
        partial_batch: 1,
        ..LibrarySettings::default()
    };
    let albums = scan_albums(root, &settings, &art, |_| partials += 1);

    assert_eq!(albums.len(), 2);
    assert_eq!(partials, 2);
    let x = albums.iter().find(|a| a.title == "X").unwrap();
    let y = albums.iter().find(|a| a.title == "Y").unwrap();
    assert_eq!(x.artist, "A");
    assert_eq!(x.folder, root.join("A/X"));
    assert_eq!(x.art.as_deref(), Some(&b"xart"[..]));
    assert_eq!(y.art.as_deref(), Some(&b"yart"[..]));
}

#[test]
fn album_tracks_sorted_by_number_with_title_fallback_and_art_propagation() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("A/X");
    touch(&folder.join("b.mp3"));
    touch(&folder.join("a.mp3"));
    touch(&folder.join("Zed Song.mp3"));

    let reader = FakeTagReader::new()
        .with_tags("a.mp3", tags("Second", "A", "X", Some(2)))
        .with_tags("b.mp3", tags("First", "A", "X", Some(1)))
        .with_art("b.mp3", b"own")
        .unreadable("Zed Song.mp3");
    let index = index_with(reader, &dir.path().join("library.json"));

    let album = Album {
        title: "X".into(),
        artist: "A".into(),
        folder,
        art: Some(ArtBytes::from(b"album".to_vec())),
    };
    let tracks = index.get_album_tracks(&album);
    let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Zed Song", "First", "Second"]);

    assert_eq!(tracks[0].artist, "A");
    assert_eq!(tracks[0].album, "X");
    assert_eq!(tracks[1].art().unwrap().as_ref(), b"own");
    assert_eq!(tracks[2].art().unwrap().as_ref(), b"album");
    assert!(tracks.iter().all(|t| t.uri().starts_with("file://")));
}

#[test]
fn all_tracks_concatenates_albums_in_index_order() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("A/X");
    let y = dir.path().join("B/Y");
    touch(&x.join("x1.mp3"));
    touch(&x.join("x2.mp3"));
    touch(&y.join("y1.mp3"));

    let reader = FakeTagReader::new()
        .with_tags("x1.mp3", tags("X One", "A", "X", Some(1)))
        .with_tags("x2.mp3", tags("X Two", "A", "X", Some(2)))
        .with_tags("y1.mp3", tags("Y One", "B", "Y", Some(1)));
    let mut index = index_with(reader, &dir.path().join("library.json"));
    let album = |title: &str, artist: &str, folder: &Path| Album {
        title: title.into(),
        artist: artist.into(),
        folder: folder.to_path_buf(),
        art: None,
    };
    index.apply(LibraryEvent::CacheLoaded(Some(vec![
        album("Y", "B", &y),
        album("X", "A", &x),
    ])));

    let titles: Vec<String> = index.all_tracks().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Y One", "X One", "X Two"]);
}

#[test]
fn scan_is_single_flight_and_persists_result() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("music");
    touch(&root.join("A/X/01.mp3"));
    let cache_path = dir.path().join("cache/library.json");

    let reader = FakeTagReader::new().with_tags("01.mp3", tags("One", "A", "X", Some(1)));
    let mut index = index_with(reader, &cache_path);

    let (tx, rx) = mpsc::channel();
    let tx2 = tx.clone();
    assert!(index.start_scan(&root, move |e| {
        let _ = tx.send(e);
    }));
    assert!(index.is_scanning());
    assert!(!index.start_scan(&root, move |e| {
        let _ = tx2.send(e);
    }));

    let finished = loop {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            e @ LibraryEvent::Finished(_) => break e,
            _ => continue,
        }
    };
    assert_eq!(index.apply(finished), LibraryUpdate::ScanFinished);
    assert!(!index.is_scanning());
    assert_eq!(index.albums().len(), 1);

    let cached = LibraryCache::new(&cache_path).load().unwrap();
    assert_eq!(cached, index.albums());
}

#[test]
fn missing_cache_requests_a_scan() {
    let dir = tempdir().unwrap();
    let mut index = index_with(FakeTagReader::new(), &dir.path().join("none.json"));
    let (tx, rx) = mpsc::channel();
    index.load_cached(move |e| {
        let _ = tx.send(e);
    });
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(index.apply(event), LibraryUpdate::NeedsScan);
    assert!(index.albums().is_empty());
}

#[test]
fn scan_of_missing_root_is_refused() {
    let dir = tempdir().unwrap();
    let mut index = index_with(FakeTagReader::new(), &dir.path().join("l.json"));
    assert!(!index.start_scan(&dir.path().join("nope"), |_| {}));
    assert!(!index.is_scanning());
}
