//! Configuration loader, schema types and persisted user settings.
//!
//! `EngineConfig` drives paths and tunables and is read from TOML plus
//! environment. `Settings` are the user toggles kept in `settings.json`.

mod load;
mod schema;
mod settings;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
pub use settings::{Settings, SettingsStore};
