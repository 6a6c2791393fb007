use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::app::{App, AppEvent};
use crate::control::ControlCmd;
use crate::engine::PlaybackEngine;
use crate::error::Result;
use crate::mpris::MprisHandle;
use crate::runtime::mpris_sync::update_mpris;

/// Longest wait between control-surface polls.
const MAX_WAIT: Duration = Duration::from_millis(50);

/// Main loop: applies background events, control commands and timers, then
/// mirrors state to MPRIS. Returns when a quit is requested.
pub fn run<E: PlaybackEngine>(
    app: &mut App<E>,
    events: &Receiver<AppEvent>,
    controls: &Receiver<ControlCmd>,
    mpris: &MprisHandle,
) -> Result<()> {
    loop {
        let now = Instant::now();
        let wait = app
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .map_or(MAX_WAIT, |d| d.min(MAX_WAIT));

        match events.recv_timeout(wait) {
            Ok(event) => {
                app.handle_event(event);
                while let Ok(event) = events.try_recv() {
                    app.handle_event(event);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("event channel closed");
                return Ok(());
            }
        }

        while let Ok(cmd) = controls.try_recv() {
            if app.handle_control(cmd) {
                info!("quit requested");
                return Ok(());
            }
        }

        app.tick(Instant::now());
        update_mpris(mpris, app);
    }
}
