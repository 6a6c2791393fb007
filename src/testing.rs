//! Test doubles shared across module tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::engine::{
    Analyzer, EngineError, EngineState, LevelEvent, LevelStream, PlaybackEngine, ProbeError,
    ProbeInfo, Prober, SeekFlags,
};
use crate::error::{Error, Result};
use crate::library::TagReader;
use crate::library::TagInfo;

/// `TagReader` answering from tables keyed by file name.
#[derive(Default)]
pub struct FakeTagReader {
    tags: HashMap<String, TagInfo>,
    art: HashMap<String, Vec<u8>>,
    unreadable: HashSet<String>,
    art_reads: Mutex<usize>,
}

impl FakeTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, file_name: &str, tags: TagInfo) -> Self {
        self.tags.insert(file_name.to_string(), tags);
        self
    }

    pub fn with_art(mut self, file_name: &str, bytes: &[u8]) -> Self {
        self.art.insert(file_name.to_string(), bytes.to_vec());
        self
    }

    pub fn unreadable(mut self, file_name: &str) -> Self {
        self.unreadable.insert(file_name.to_string());
        self
    }

    pub fn art_reads(&self) -> usize {
        self.art_reads.lock().map(|n| *n).unwrap_or(0)
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl TagReader for FakeTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagInfo> {
        let name = name_of(path);
        if self.unreadable.contains(&name) {
            return Err(Error::Tag {
                path: path.display().to_string(),
                reason: "unreadable".into(),
            });
        }
        Ok(self.tags.get(&name).cloned().unwrap_or_default())
    }

    fn read_embedded_art(&self, path: &Path) -> Option<Vec<u8>> {
        if let Ok(mut n) = self.art_reads.lock() {
            *n += 1;
        }
        self.art.get(&name_of(path)).cloned()
    }
}

pub fn tags(title: &str, artist: &str, album: &str, track: Option<u32>) -> TagInfo {
    TagInfo {
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        album: Some(album.to_string()),
        track_number: track,
        duration: None,
    }
}

/// `Prober` with canned answers per URI; anything else probes as a
/// one-microsecond file with no tags.
#[derive(Default)]
pub struct FakeProber {
    answers: HashMap<String, std::result::Result<ProbeInfo, ProbeError>>,
}

impl FakeProber {
    pub fn answer(mut self, uri: &str, r: std::result::Result<ProbeInfo, ProbeError>) -> Self {
        self.answers.insert(uri.to_string(), r);
        self
    }
}

impl Prober for FakeProber {
    fn probe(&self, uri: &str) -> std::result::Result<ProbeInfo, ProbeError> {
        self.answers.get(uri).cloned().unwrap_or_else(|| {
            Ok(ProbeInfo {
                duration_ns: 1_000,
                ..ProbeInfo::default()
            })
        })
    }
}

/// `Analyzer` producing a fixed number of identical level events per run.
pub struct ScriptedAnalyzer {
    levels: usize,
    db: f64,
    fail_after: Option<usize>,
    panic: bool,
    opened: Mutex<Vec<String>>,
    gate: Mutex<Option<Receiver<()>>>,
}

impl ScriptedAnalyzer {
    pub fn new(levels: usize, db: f64) -> Self {
        Self {
            levels,
            db,
            fail_after: None,
            panic: false,
            opened: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    /// Hold the first run inside `open` until the returned sender fires
    /// (or is dropped).
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        self.gate = Mutex::new(Some(rx));
        (self, tx)
    }

    /// Emit an error event after `n` levels instead of end-of-stream.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn open(&self, uri: &str, _interval: Duration) -> std::result::Result<LevelStream, EngineError> {
        if let Ok(mut v) = self.opened.lock() {
            v.push(uri.to_string());
        }
        let gate = self.gate.lock().ok().and_then(|mut g| g.take());
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        if self.panic {
            panic!("scripted analyzer panic");
        }
        let mut events: Vec<LevelEvent> = Vec::new();
        match self.fail_after {
            Some(n) => {
                events.extend((0..n).map(|_| LevelEvent::Level(vec![self.db, self.db])));
                events.push(LevelEvent::Error("decoder went away".into()));
                events.push(LevelEvent::Level(vec![0.0]));
            }
            None => {
                events.extend((0..self.levels).map(|_| LevelEvent::Level(vec![self.db, self.db])));
                events.push(LevelEvent::Eos);
            }
        }
        Ok(Box::new(events.into_iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetUri(String),
    SetState(EngineState),
    Seek(u64),
}

/// `PlaybackEngine` that records commands and answers queries from fields
/// the test sets. It never emits events; tests feed them by hand.
#[derive(Default)]
pub struct MockEngine {
    pub calls: Vec<EngineCall>,
    pub state: EngineState,
    pub uri: Option<String>,
    pub position_ns: Option<u64>,
    pub duration_ns: Option<u64>,
    pub fail_play: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uris_loaded(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::SetUri(u) => Some(u.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackEngine for MockEngine {
    fn set_uri(&mut self, uri: &str) {
        self.calls.push(EngineCall::SetUri(uri.to_string()));
        self.uri = Some(uri.to_string());
    }

    fn set_state(&mut self, state: EngineState) -> std::result::Result<(), EngineError> {
        self.calls.push(EngineCall::SetState(state));
        if self.fail_play && state == EngineState::Playing {
            return Err(EngineError::Open {
                uri: self.uri.clone().unwrap_or_default(),
                reason: "scripted failure".into(),
            });
        }
        self.state = state;
        Ok(())
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn query_position(&self) -> Option<u64> {
        self.position_ns
    }

    fn query_duration(&self) -> Option<u64> {
        self.duration_ns
    }

    fn seek(&mut self, position_ns: u64, _flags: SeekFlags) -> std::result::Result<(), EngineError> {
        self.calls.push(EngineCall::Seek(position_ns));
        self.position_ns = Some(position_ns);
        Ok(())
    }
}
