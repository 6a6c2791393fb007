//! The playlist: ordered tracks, current-track marking and persistence.

mod persist;
mod store;

pub use persist::{PlaylistEvent, SaveDebouncer, load_from, save_to, spawn_load, spawn_repair};
pub use store::Playlist;
