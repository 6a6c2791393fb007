use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::cache::write_atomic;
use crate::control::{ControlCmd, ControlSnapshot, PlaybackStatus};
use crate::error::Result;
use crate::library::path_to_uri;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.mamo";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const POLL: Duration = Duration::from_millis(200);

const MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/flac",
    "audio/ogg",
    "audio/opus",
    "audio/mp4",
    "audio/aac",
    "audio/wav",
];

#[derive(Debug, Default)]
struct SharedState {
    snapshot: ControlSnapshot,
    art_path: Option<PathBuf>,
}

/// Main-loop side of the bridge. Publishing a snapshot is cheap; the bus
/// thread picks up status and metadata changes and signals them.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
    art_dir: PathBuf,
}

impl MprisHandle {
    pub fn publish(&self, snapshot: ControlSnapshot) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let metadata_changed = s.snapshot.metadata != snapshot.metadata;
        let changed = metadata_changed || s.snapshot.status != snapshot.status;
        if metadata_changed {
            s.art_path = snapshot
                .metadata
                .as_ref()
                .and_then(|m| m.art.as_deref())
                .and_then(|bytes| write_art(&self.art_dir, bytes));
        }
        s.snapshot = snapshot;
        drop(s);

        if changed {
            let _ = self.notify.send(());
        }
    }
}

/// Art is handed out by URL, so it has to exist as a file. Named by content
/// hash; an existing file is reused.
fn write_art(dir: &Path, bytes: &[u8]) -> Option<PathBuf> {
    let key = hex::encode(Sha256::digest(bytes));
    let path = dir.join(format!("art-{}", &key[..16]));
    if path.exists() {
        return Some(path);
    }
    match write_atomic(&path, bytes) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write art for MPRIS");
            None
        }
    }
}

fn owned<'a>(v: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(v.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Nothing to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "Mamo"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        MIME_TYPES.iter().map(|m| m.to_string()).collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| s.snapshot.status)
            .unwrap_or(PlaybackStatus::Stopped)
            .as_str()
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state
            .lock()
            .map(|s| i64::try_from(s.snapshot.position_us).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let Some(meta) = s.snapshot.metadata.as_ref() else {
            if let Some(v) = ObjectPath::try_from(NO_TRACK).ok().and_then(owned) {
                map.insert("mpris:trackid".to_string(), v);
            }
            return map;
        };

        let track_id = ObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", meta.index)).ok();
        let mut entries: Vec<(&str, Option<OwnedValue>)> = vec![
            ("mpris:trackid", track_id.and_then(owned)),
            ("xesam:title", owned(meta.title.as_str())),
            ("xesam:artist", owned(vec![meta.artist.clone()])),
            ("xesam:album", owned(meta.album.as_str())),
            ("xesam:url", owned(meta.uri.as_str())),
        ];
        if let Some(us) = meta.length_us.and_then(|us| i64::try_from(us).ok()) {
            entries.push(("mpris:length", owned(us)));
        }
        if let Some(url) = s.art_path.as_deref().and_then(|p| path_to_uri(p).ok()) {
            entries.push(("mpris:artUrl", owned(url)));
        }

        for (key, value) in entries {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        }
        map
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
) -> Result<Connection> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    Ok(connection)
}

async fn emit_changes(connection: &Connection) -> Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let iface = iface_ref.get().await;
    let emitter = iface_ref.signal_emitter();
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    Ok(())
}

/// Drain change notifications; `None` once the handle is gone.
fn take_pending(rx: &Receiver<()>) -> Option<bool> {
    let mut pending = false;
    loop {
        match rx.try_recv() {
            Ok(()) => pending = true,
            Err(TryRecvError::Empty) => return Some(pending),
            Err(TryRecvError::Disconnected) => return None,
        }
    }
}

/// Expose the player on the session bus from a dedicated thread.
///
/// Bus failures are logged and leave the handle working as a no-op.
pub fn spawn_mpris(tx: Sender<ControlCmd>, art_dir: PathBuf) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match serve(tx, state_for_thread).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "MPRIS unavailable");
                    return;
                }
            };
            info!(name = BUS_NAME, "MPRIS registered");

            loop {
                Timer::after(POLL).await;
                match take_pending(&notify_rx) {
                    Some(true) => {
                        if let Err(e) = emit_changes(&connection).await {
                            debug!(error = %e, "MPRIS change signal failed");
                        }
                    }
                    Some(false) => {}
                    None => break,
                }
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
        art_dir,
    }
}
