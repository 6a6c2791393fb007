//! Discovery: URIs and folders in, `Track`s out, on background threads.

mod pipeline;

pub use pipeline::{Discoverer, DiscoveryError};

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::config::LibrarySettings;
use crate::library::{Track, audio_files_under, path_to_uri};

#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    Discovered(Track),
    Failed { uri: String, error: DiscoveryError },
}

fn discover_one(discoverer: &Discoverer, uri: &str) -> DiscoveryEvent {
    match discoverer.discover(uri) {
        Ok(track) => DiscoveryEvent::Discovered(track),
        Err(error) => {
            match &error {
                DiscoveryError::UnsupportedUri(_) | DiscoveryError::MissingCodec(_) => {
                    info!(uri = %uri, error = %error, "skipping file");
                }
                DiscoveryError::Failed { .. } => warn!(uri = %uri, error = %error, "discovery failed"),
            }
            DiscoveryEvent::Failed {
                uri: uri.to_string(),
                error,
            }
        }
    }
}

/// Discover `uri` on its own thread. Never retried.
pub fn spawn_discover<F>(discoverer: Arc<Discoverer>, uri: String, post: F)
where
    F: Fn(DiscoveryEvent) + Send + 'static,
{
    thread::spawn(move || post(discover_one(&discoverer, &uri)));
}

/// Discover every audio file below `folder` on one background thread.
pub fn spawn_folder<F>(discoverer: Arc<Discoverer>, folder: PathBuf, settings: LibrarySettings, post: F)
where
    F: Fn(DiscoveryEvent) + Send + 'static,
{
    thread::spawn(move || {
        let files = audio_files_under(&folder, &settings);
        info!(folder = %folder.display(), files = files.len(), "folder discovery started");
        for file in files {
            match path_to_uri(&file) {
                Ok(uri) => post(discover_one(&discoverer, &uri)),
                Err(e) => warn!(path = %file.display(), error = %e, "skipping file"),
            }
        }
    });
}
