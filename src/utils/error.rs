//! Error types and handling
//!
//! Common error types used across the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureError;
use crate::captions::CaptionError;
use crate::export::ExportError;
use crate::recorder::RecordingError;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("caption error: {0}")]
    Caption(#[from] CaptionError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Capture(e) => e.code(),
            AppError::Recording(e) => e.code(),
            AppError::Caption(e) => e.code(),
            AppError::Export(e) => e.code(),
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// User-facing error payload, suitable for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorNotice {
    fn from(error: &AppError) -> Self {
        ErrorNotice {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
