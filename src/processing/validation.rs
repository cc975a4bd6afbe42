//! Precondition checks run before any file is touched

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ConversionRequest;
use crate::error::{Result, ImageminError};

/// Validate a request and prepare the destination directory
///
/// Every failure here is fatal: the batch must not start.
pub fn prepare(request: &ConversionRequest) -> Result<()> {
    if request.source_directory.as_os_str().is_empty()
        || request.destination_directory.as_os_str().is_empty()
    {
        return Err(ImageminError::DirectoryUndefined);
    }

    request.validate()?;

    if !request.source_directory.is_dir() {
        return Err(ImageminError::source_missing(request.source_directory.clone()));
    }

    ensure_directory(&request.destination_directory)?;

    debug!("Preconditions satisfied for {:?}", request.source_directory);
    Ok(())
}

/// Create `path` and its parents if absent
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    if path.exists() {
        return Err(ImageminError::create_destination(
            path.to_path_buf(),
            "path exists and is not a directory",
        ));
    }

    fs::create_dir_all(path)
        .map_err(|e| ImageminError::create_destination(path.to_path_buf(), e.to_string()))?;

    info!("Created target directory {:?}", path);
    Ok(())
}
