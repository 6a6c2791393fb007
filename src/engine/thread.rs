use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use super::level::LevelTap;
use super::sink::create_sink_at;
use super::types::{EngineError, EngineEvent, EngineState, EventSink, StatusHandle};

/// How often the thread checks for a drained sink when idle.
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub(super) enum EngineCmd {
    SetUri(String),
    SetState(EngineState),
    Seek(Duration),
    Quit,
}

struct Pipeline {
    stream: Result<OutputStream, String>,
    uri: Option<String>,
    sink: Option<Sink>,
    state: EngineState,
    started_at: Option<Instant>,
    accumulated: Duration,
    duration: Option<Duration>,
    eos_sent: bool,
    meter_interval: Duration,
    post: EventSink,
    status: StatusHandle,
}

impl Pipeline {
    fn publish(&self) {
        if let Ok(mut s) = self.status.lock() {
            s.state = self.state;
            s.duration = self.duration;
            s.accumulated = self.accumulated;
            s.started_at = self.started_at;
        }
    }

    fn transition(&mut self, new: EngineState) {
        let old = self.state;
        self.state = new;
        self.publish();
        if old != new {
            (self.post)(EngineEvent::StateChanged { old, new });
        }
    }

    fn fail(&mut self, err: EngineError) {
        error!(error = %err, "playback pipeline error");
        self.teardown();
        self.transition(EngineState::Null);
        (self.post)(EngineEvent::Error(err.to_string()));
    }

    fn teardown(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.duration = None;
        self.eos_sent = false;
    }

    /// Build a fresh paused sink for the current URI at `at`.
    fn build_sink(&mut self, at: Duration) -> Result<(), EngineError> {
        let stream = self
            .stream
            .as_ref()
            .map_err(|e| EngineError::NoOutputDevice(e.clone()))?;
        let uri = self.uri.as_deref().ok_or(EngineError::NoUri)?;

        let post = Arc::clone(&self.post);
        let tap: LevelTap = Arc::new(move |levels: Vec<f64>| post(EngineEvent::Loudness(levels)));
        let (sink, total) = create_sink_at(stream, uri, at, self.meter_interval, tap)?;

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.accumulated = at;
        self.started_at = None;
        self.eos_sent = false;

        if self.duration.is_none() && total.is_some() {
            self.duration = total;
            self.publish();
            (self.post)(EngineEvent::DurationChanged);
        }
        Ok(())
    }

    fn set_uri(&mut self, uri: String) {
        debug!(uri = %uri, "engine uri set");
        self.teardown();
        if self.state != EngineState::Null {
            self.transition(EngineState::Null);
        }
        self.uri = Some(uri);
        self.publish();
    }

    fn set_state(&mut self, target: EngineState) {
        match target {
            EngineState::Null => {
                self.teardown();
                self.transition(EngineState::Null);
            }
            EngineState::Paused | EngineState::Playing => {
                if self.sink.is_none() {
                    if let Err(e) = self.build_sink(Duration::ZERO) {
                        self.fail(e);
                        return;
                    }
                }
                let Some(sink) = self.sink.as_ref() else {
                    return;
                };
                if target == EngineState::Playing {
                    sink.play();
                    if self.started_at.is_none() {
                        self.started_at = Some(Instant::now());
                    }
                } else {
                    sink.pause();
                    if let Some(st) = self.started_at.take() {
                        self.accumulated += st.elapsed();
                    }
                }
                self.transition(target);
            }
        }
    }

    fn seek(&mut self, to: Duration) {
        if self.uri.is_none() || self.state == EngineState::Null {
            debug!("seek ignored: nothing loaded");
            return;
        }
        let to = match self.duration {
            Some(d) => to.min(d),
            None => to,
        };
        // Rebuild the sink and skip into the file.
        if let Err(e) = self.build_sink(to) {
            self.fail(e);
            return;
        }
        if self.state == EngineState::Playing {
            if let Some(s) = self.sink.as_ref() {
                s.play();
            }
            self.started_at = Some(Instant::now());
        }
        self.publish();
    }

    fn tick(&mut self) {
        if self.state != EngineState::Playing || self.eos_sent {
            return;
        }
        if let Some(s) = self.sink.as_ref() {
            if s.empty() {
                self.eos_sent = true;
                if let Some(st) = self.started_at.take() {
                    self.accumulated += st.elapsed();
                }
                if let Some(d) = self.duration {
                    self.accumulated = self.accumulated.min(d);
                }
                self.publish();
                (self.post)(EngineEvent::Eos);
            }
        }
    }
}

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    status: StatusHandle,
    post: EventSink,
    meter_interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut s) => {
                // rodio logs to stderr when the stream is dropped.
                s.log_on_drop(false);
                Ok(s)
            }
            Err(e) => {
                warn!(error = %e, "no audio output device");
                Err(e.to_string())
            }
        };

        let mut p = Pipeline {
            stream,
            uri: None,
            sink: None,
            state: EngineState::Null,
            started_at: None,
            accumulated: Duration::ZERO,
            duration: None,
            eos_sent: false,
            meter_interval,
            post,
            status,
        };

        loop {
            match rx.recv_timeout(TICK) {
                Ok(EngineCmd::SetUri(uri)) => p.set_uri(uri),
                Ok(EngineCmd::SetState(state)) => p.set_state(state),
                Ok(EngineCmd::Seek(to)) => p.seek(to),
                Ok(EngineCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    p.teardown();
                    p.transition(EngineState::Null);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            p.tick();
        }
    })
}
