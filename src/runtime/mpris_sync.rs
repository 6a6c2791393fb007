use crate::app::App;
use crate::engine::PlaybackEngine;
use crate::mpris::MprisHandle;

/// Push a fresh snapshot when transport state changed since the last call.
pub fn update_mpris<E: PlaybackEngine>(mpris: &MprisHandle, app: &mut App<E>) {
    if app.take_control_dirty() {
        mpris.publish(app.control_snapshot());
    }
}
