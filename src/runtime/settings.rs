use tracing::warn;

use crate::config::EngineConfig;

/// Load and validate the engine configuration. Problems are logged and
/// the defaults used instead.
pub fn load_config() -> EngineConfig {
    match EngineConfig::load() {
        Ok(c) => {
            if let Err(e) = c.validate() {
                warn!(error = %e, "invalid config, using defaults");
                EngineConfig::default()
            } else {
                c
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            warn!(error = %e, "failed to load config, using defaults");
            EngineConfig::default()
        }
    }
}
