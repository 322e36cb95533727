//! Reads and writes cassette and record files.
//!
//! The format follows the extension: `.json` files are JSON, everything else
//! is YAML. Writes go to a temporary file in the target directory which is then
//! renamed over the target, so a reader never sees a half-written cassette.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::RecorderError;

/// On-disk encoding of a cassette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

impl FileFormat {
    /// Format implied by the path's extension.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

/// Serializes `value` and writes it to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), RecorderError> {
    let text = match FileFormat::for_path(path) {
        FileFormat::Json => serde_json::to_string(value)
            .map_err(|source| RecorderError::Json { path: path.to_path_buf(), source })?,
        FileFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|source| RecorderError::Yaml { path: path.to_path_buf(), source })?,
    };
    write_atomic(path, text.as_bytes())
}

/// Reads and deserializes `path`.
///
/// # Errors
///
/// Returns [`RecorderError::CassetteNotFound`] if the file does not exist,
/// never an empty default, and a parse error if the content is malformed.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, RecorderError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RecorderError::CassetteNotFound { path: path.to_path_buf() });
        }
        Err(source) => return Err(RecorderError::Io { path: path.to_path_buf(), source }),
    };
    debug!(path = %path.display(), "Loading record file");

    match FileFormat::for_path(path) {
        FileFormat::Json => serde_json::from_str(&content)
            .map_err(|source| RecorderError::Json { path: path.to_path_buf(), source }),
        FileFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|source| RecorderError::Yaml { path: path.to_path_buf(), source }),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RecorderError> {
    let io_err = |source| RecorderError::Io { path: path.to_path_buf(), source };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    debug!(folder = %parent.display(), "Making record folder");
    std::fs::create_dir_all(parent).map_err(io_err)?;

    let mut file = NamedTempFile::new_in(parent).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    debug!(path = %path.display(), "Writing record file");
    Ok(())
}
