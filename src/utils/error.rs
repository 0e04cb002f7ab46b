//! Error types and handling
//!
//! Application-wide error type that every widget operation returns.

use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::recorder::RecorderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording error: {0}")]
    Recording(#[from] RecorderError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Stable machine-readable code for the host UI
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Capture(CaptureError::PermissionDenied { .. }) => "PERMISSION_DENIED",
            AppError::Capture(CaptureError::NoDisplaySelected) => "NO_DISPLAY_SELECTED",
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Recording(RecorderError::NoCaptureSession) => "NO_CAPTURE_SESSION",
            AppError::Recording(_) => "RECORDING_ERROR",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Error response for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        ErrorResponse::from(&error)
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
