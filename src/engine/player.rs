use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AnalysisSettings;

use super::thread::{EngineCmd, spawn_engine_thread};
use super::types::{
    EngineError, EngineState, EngineStatus, EventSink, PlaybackEngine, SeekFlags, StatusHandle,
    duration_to_ns,
};

/// `PlaybackEngine` backed by a dedicated rodio thread.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    status: StatusHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioEngine {
    pub fn new(settings: &AnalysisSettings, post: EventSink) -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let status: StatusHandle = Arc::new(Mutex::new(EngineStatus::default()));
        let handle = spawn_engine_thread(
            rx,
            status.clone(),
            post,
            Duration::from_millis(settings.live_interval_ms),
        );
        Self {
            tx,
            status,
            join: Mutex::new(Some(handle)),
        }
    }

    fn send(&self, cmd: EngineCmd) -> Result<(), EngineError> {
        self.tx.send(cmd).map_err(|_| EngineError::Disconnected)
    }

    fn snapshot(&self) -> EngineStatus {
        self.status.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Stop the thread and wait for it to release the output device.
    pub fn shutdown(&self) {
        let _ = self.send(EngineCmd::Quit);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn set_uri(&mut self, uri: &str) {
        let _ = self.send(EngineCmd::SetUri(uri.to_string()));
    }

    fn set_state(&mut self, state: EngineState) -> Result<(), EngineError> {
        self.send(EngineCmd::SetState(state))
    }

    fn state(&self) -> EngineState {
        self.snapshot().state
    }

    fn query_position(&self) -> Option<u64> {
        let s = self.snapshot();
        (s.state != EngineState::Null).then(|| duration_to_ns(s.position()))
    }

    fn query_duration(&self) -> Option<u64> {
        self.snapshot().duration.map(duration_to_ns)
    }

    fn seek(&mut self, position_ns: u64, _flags: SeekFlags) -> Result<(), EngineError> {
        // Rebuilding the sink always flushes and lands accurately.
        self.send(EngineCmd::Seek(Duration::from_nanos(position_ns)))
    }
}
