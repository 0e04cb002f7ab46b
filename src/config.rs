//! Recorder configuration
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use crate::capture::CaptureConstraints;
use crate::export::ExportOptions;
use crate::recorder::EncoderOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What happens to the capture when recording stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopPolicy {
    /// Stop every capture track; a new capture is needed to record again
    ReleaseCapture,
    /// Keep the capture and its live preview running
    KeepPreview,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self::ReleaseCapture
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    pub capture: CaptureConstraints,
    pub encoder: EncoderOptions,
    pub export: ExportOptions,
    pub stop_policy: StopPolicy,
    /// Where `DirectorySink` saves downloads
    pub download_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConstraints::default(),
            encoder: EncoderOptions::default(),
            export: ExportOptions::default(),
            stop_policy: StopPolicy::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

impl RecorderConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: RecorderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded recorder config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.export
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.encoder.timeslice_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "encoder.timesliceMs must be greater than zero".to_string(),
            ));
        }
        if matches!(&self.encoder.mime_type, Some(m) if m.trim().is_empty()) {
            return Err(ConfigError::Invalid("encoder.mimeType is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: RecorderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RecorderConfig::default());
        assert_eq!(config.stop_policy, StopPolicy::ReleaseCapture);
        assert_eq!(config.export.file_name, "recorded-video.mp4");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"stopPolicy": "keepPreview", "encoder": {{"timesliceMs": 500}}, "export": {{"fileName": "demo.webm"}}}}"#
        )
        .unwrap();

        let config = RecorderConfig::load(file.path()).unwrap();
        assert_eq!(config.stop_policy, StopPolicy::KeepPreview);
        assert_eq!(config.encoder.timeslice_ms, Some(500));
        assert_eq!(config.export.file_name, "demo.webm");
        assert_eq!(config.export.content_type, "video/webm");
    }

    #[test]
    fn test_rejects_zero_timeslice() {
        let config = RecorderConfig {
            encoder: EncoderOptions {
                timeslice_ms: Some(0),
                ..EncoderOptions::default()
            },
            ..RecorderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecorderConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
