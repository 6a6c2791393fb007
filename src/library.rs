//! Music library: track/album model, tag and art resolution, folder
//! scanning and the album index.

mod art;
mod index;
mod model;
mod scan;
mod tags;
mod uri;

pub use art::ArtResolver;
pub use index::{LibraryEvent, LibraryIndex, LibraryUpdate};
pub use model::*;
pub use scan::{audio_files_in, audio_files_under};
pub use tags::{LoftyTagReader, TagInfo, TagReader, fallback_title};
pub use uri::{path_to_uri, uri_to_path};

#[cfg(test)]
pub(crate) use scan::scan_albums;

#[cfg(test)]
mod tests;
