//! Engine error taxonomy.

use thiserror::Error;

/// Errors that can occur during action loading and resolution.
///
/// Expression failures never reach this type: conditions and parameter
/// expressions recover locally with a logged warning and a default.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse/deserialization error.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Action type discriminator with no registered factory.
    #[error("unknown action type: '{0}'")]
    UnknownActionType(String),

    /// Filesystem watcher error.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
