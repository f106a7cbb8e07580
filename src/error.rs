//! Error types shared by the normalizer and the diff reporter

use thiserror::Error;

/// Errors raised by `reprod_diff`
#[derive(Debug, Error)]
pub enum Error {
    /// Input was not the container or array kind the operation expects
    #[error("type error: {0}")]
    TypeKind(String),

    /// An argument was outside its accepted domain (statistic name, threshold)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A diff tree node is neither a statistic record nor a traversable mapping
    #[error("malformed record at '{path}': {reason}")]
    MalformedRecord {
        /// Slash-joined key path of the offending node
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Element count does not match the declared shape
    #[error("shape error: {0}")]
    Shape(String),

    /// `init_logger` was called more than once in this process
    #[error("logger has already been initialized")]
    LoggerAlreadyInitialized,

    /// Tensor construction or device copy failed
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    /// Reading or writing a file failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON input could not be parsed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML config could not be parsed
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
