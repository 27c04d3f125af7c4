//! Error types for gvim

use std::path::PathBuf;

use thiserror::Error;

use crate::plugin::PluginError;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Editor error types
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No such scheme: {0}")]
    NoSuchScheme(String),

    #[error("No configuration directory available")]
    NoHome,

    #[error("{0}")]
    Message(String),
}

impl EditorError {
    /// Wrap a serde_json error with the file it came from
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        EditorError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Read a file, mapping a missing file to [`EditorError::FileNotFound`]
pub fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EditorError::FileNotFound(path.to_path_buf())
        } else {
            EditorError::Io(e)
        }
    })
}

/// Read and deserialize a JSON file
pub fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|e| EditorError::json(path, e))
}
