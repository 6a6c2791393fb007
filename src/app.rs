//! Application module: the main-loop model tying playback, playlist,
//! library and analysis together, plus the now-playing view model.

mod model;
mod now_playing;

pub use model::{App, AppEvent, Services};
pub use now_playing::{DEFAULT_BARS, NowPlaying, format_time};
