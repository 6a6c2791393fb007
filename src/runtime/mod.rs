use std::env;
use std::sync::mpsc;

use tracing::info;

use crate::app::AppEvent;
use crate::control::ControlCmd;
use crate::error::Result;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

/// Run the player until a quit command arrives.
///
/// Positional arguments are files, folders or URIs to open.
pub fn run() -> Result<()> {
    let config = settings::load_config();
    let args: Vec<String> = env::args().skip(1).collect();

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();

    let mut app = startup::build_app(config, event_tx);
    let mpris = crate::mpris::spawn_mpris(control_tx, env::temp_dir().join("mamo-art"));

    app.start(args);
    mpris_sync::update_mpris(&mpris, &mut app);

    let result = event_loop::run(&mut app, &event_rx, &control_rx, &mpris);

    info!("shutting down");
    app.shutdown();
    app.engine().shutdown();
    result
}
