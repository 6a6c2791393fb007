use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::app::{App, AppEvent, Services};
use crate::config::{EngineConfig, SettingsStore};
use crate::engine::{EventSink, RodioAnalyzer, RodioEngine, RodioProber};
use crate::library::{LoftyTagReader, TagReader};

/// Wire the rodio engine, lofty tags and the persisted settings into an app
/// whose background work reports to `events`.
pub fn build_app(config: EngineConfig, events: Sender<AppEvent>) -> App<RodioEngine> {
    let engine_tx = events.clone();
    let sink: EventSink = Arc::new(move |e| {
        let _ = engine_tx.send(AppEvent::Engine(e));
    });
    let engine = RodioEngine::new(&config.analysis, sink);

    let settings = SettingsStore::load(config.paths.settings_file());
    let tags: Arc<dyn TagReader> = Arc::new(LoftyTagReader);
    let services = Services {
        prober: Arc::new(RodioProber),
        analyzer: Arc::new(RodioAnalyzer),
        tags,
    };

    App::new(engine, config, settings, services, events)
}
