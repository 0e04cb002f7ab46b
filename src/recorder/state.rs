//! Recording state management
//!
//! Defines the recording state machine and the finalized artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// State of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Encoder created but not started
    Idle,
    /// Currently recording
    Recording,
    /// Stop requested; the artifact may still be flushing
    Stopped,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Recording errors
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("No capture session; start a capture first")]
    NoCaptureSession,

    #[error("Capture session has ended; start a new capture")]
    CaptureEnded,

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Encoder went away before the recording was finalized")]
    EncoderAborted,

    #[error("Recording was discarded because a new capture started")]
    Superseded,
}

pub type RecorderResult<T> = Result<T, RecorderError>;

/// Ordered encoded chunks of one completed recording
///
/// Cloning is cheap; the chunk list is shared and never mutated.
#[derive(Debug, Clone)]
pub struct RecordedArtifact {
    id: Uuid,
    recording_id: Uuid,
    mime_type: String,
    chunks: Arc<Vec<Vec<u8>>>,
    created_at: DateTime<Utc>,
}

/// Presentation summary of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub id: Uuid,
    pub mime_type: String,
    pub chunk_count: usize,
    pub byte_len: usize,
    pub created_at: DateTime<Utc>,
}

impl RecordedArtifact {
    pub fn new(recording_id: Uuid, mime_type: impl Into<String>, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recording_id,
            mime_type: mime_type.into(),
            chunks: Arc::new(chunks),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The recording session that produced this artifact
    pub fn recording_id(&self) -> Uuid {
        self.recording_id
    }

    /// MIME type reported by the encoder
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            id: self.id,
            mime_type: self.mime_type.clone(),
            chunk_count: self.chunk_count(),
            byte_len: self.byte_len(),
            created_at: self.created_at,
        }
    }
}
