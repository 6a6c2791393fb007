use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// `file://` URI for an absolute local path.
pub fn path_to_uri(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|_| Error::Uri(absolute.display().to_string()))
}

/// Local path of a `file://` URI; any other scheme is rejected.
pub fn uri_to_path(uri: &str) -> Result<PathBuf> {
    let url = Url::parse(uri).map_err(|_| Error::Uri(uri.to_string()))?;
    if url.scheme() != "file" {
        return Err(Error::Uri(uri.to_string()));
    }
    url.to_file_path().map_err(|_| Error::Uri(uri.to_string()))
}
