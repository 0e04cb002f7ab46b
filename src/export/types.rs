//! Export types and configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// How a finished recording is offered for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Name of the saved file. A label only: the payload's container is
    /// whatever the encoder produced.
    pub file_name: String,
    /// Content type claimed for the downloaded blob
    pub content_type: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "recorded-video.mp4".to_string(),
            content_type: "video/webm".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> ExportResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(ExportError::InvalidFileName(self.file_name.clone()));
        }
        if self.file_name.contains(['/', '\\']) || self.file_name == "." || self.file_name == ".." {
            return Err(ExportError::InvalidFileName(self.file_name.clone()));
        }
        if self.content_type.trim().is_empty() {
            return Err(ExportError::InvalidContentType(self.content_type.clone()));
        }
        Ok(())
    }
}

/// A file written by a download sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    pub path: PathBuf,
    /// `file://` URI of the saved file
    pub uri: String,
    pub bytes: usize,
}

/// Result of a download request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum DownloadOutcome {
    /// Nothing recorded; no save action was triggered
    Skipped,
    /// The artifact was saved
    Saved(SavedFile),
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("Invalid content type: {0:?}")]
    InvalidContentType(String),

    #[error("Unknown or revoked object URL: {0}")]
    UnknownObjectUrl(String),
}

pub type ExportResult<T> = Result<T, ExportError>;
