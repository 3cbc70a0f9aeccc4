use thiserror::Error;

/// Errors surfaced by an editing session.
///
/// `NotReady` and `EmptyHistory` are informational: the session is left
/// untouched and callers are free to treat them as no-ops.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("No image loaded")]
    NotReady,

    #[error("Nothing to undo or redo")]
    EmptyHistory,

    #[error("Layer is {actual:?} but source image is {expected:?}")]
    DimensionMismatch {
        expected: [u32; 2],
        actual: [u32; 2],
    },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Result type for session operations
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config data: {0}")]
    Parse(#[from] serde_json::Error),
}
