//! Error types for gauge calibration
//!
//! Nothing in here is fatal: every variant is recovered at the workspace
//! boundary and turned into status text for the user.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Result type alias for calibration operations
pub type Result<T> = std::result::Result<T, CalibrationError>;

/// Sources are shared so results can travel inside cloneable UI messages
#[derive(Error, Debug, Clone)]
pub enum CalibrationError {
    /// The editable configuration text is not valid JSON of the expected shape
    #[error("Configuration text is invalid: {source}")]
    ConfigParse {
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A field an action depends on has not been calibrated yet
    #[error("Configuration is incomplete: `{field}` must be set first")]
    ConfigIncomplete { field: &'static str },

    /// The reading service could not be reached or answered with a non-2xx status
    #[error("Reading service unavailable: {message}")]
    ServiceUnavailable {
        message: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    /// The reading service answered 2xx but the body was not what we expect
    #[error("Malformed reading service response: {message}")]
    ServiceResponse { message: String },

    /// An image file could not be read from disk
    #[error("Failed to read image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Image bytes are not a decodable picture (or not valid base64)
    #[error("Image could not be decoded: {reason}")]
    ImageDecode { reason: String },

    /// Calibration and submission need an image in the workspace
    #[error("No image loaded")]
    NoImage,

    /// The history gallery has no entry at this position
    #[error("No history entry at index {index}")]
    UnknownHistoryEntry { index: usize },
}

impl CalibrationError {
    pub fn config_parse(source: serde_json::Error) -> Self {
        Self::ConfigParse {
            source: Arc::new(source),
        }
    }

    pub fn incomplete(field: &'static str) -> Self {
        Self::ConfigIncomplete { field }
    }

    pub fn unavailable<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ServiceUnavailable {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn bad_response(message: impl Into<String>) -> Self {
        Self::ServiceResponse {
            message: message.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::ImageDecode {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }
}
