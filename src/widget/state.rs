//! Widget state container
//!
//! Holds the session triple (capture, recording, artifact) plus the recording
//! flag. All transitions are synchronous so they can be exercised without a
//! rendering surface or a platform backend.

use crate::capture::{CaptureSession, CaptureSummary, MediaStream};
use crate::config::StopPolicy;
use crate::recorder::{
    PendingArtifact, RecordedArtifact, RecorderError, RecorderResult, RecordingSession,
    RecordingState,
};
use crate::utils::{AppError, ErrorResponse};

/// Sessions pushed out by a new capture
#[must_use]
pub struct Displaced {
    capture: Option<CaptureSession>,
    recording: Option<RecordingSession>,
}

impl Displaced {
    /// Stop the old encoder and release the old tracks
    pub fn teardown(self) {
        if let Some(recording) = self.recording {
            tracing::debug!("Aborting recording {} for new capture", recording.id());
            recording.abort();
        }
        if let Some(capture) = self.capture {
            capture.release();
        }
    }
}

/// Identifies the capture and the recording an artifact is produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTicket {
    generation: u64,
    sequence: u64,
}

/// Result of stopping the active recording
pub struct StopOutcome {
    pub pending: RecorderResult<PendingArtifact>,
    /// Capture taken out of the state under `StopPolicy::ReleaseCapture`
    pub released: Option<CaptureSession>,
}

/// Point-in-time copy of the widget state for presentation
#[derive(Debug, Clone, Default)]
pub struct WidgetSnapshot {
    pub capture: Option<CaptureSummary>,
    pub recording: bool,
    pub recording_state: Option<RecordingState>,
    pub artifact: Option<RecordedArtifact>,
    pub last_error: Option<ErrorResponse>,
}

#[derive(Default)]
pub struct WidgetState {
    capture: Option<CaptureSession>,
    recording: Option<RecordingSession>,
    artifact: Option<RecordedArtifact>,
    is_recording: bool,
    /// Bumped on every installed capture; artifacts from older generations are dropped
    generation: u64,
    /// Number of recordings reserved so far
    sequence: u64,
    /// Sequence of the recording that produced `artifact`
    artifact_sequence: u64,
    last_error: Option<ErrorResponse>,
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self) -> Option<&CaptureSession> {
        self.capture.as_ref()
    }

    pub fn recording(&self) -> Option<&RecordingSession> {
        self.recording.as_ref()
    }

    pub fn artifact(&self) -> Option<&RecordedArtifact> {
        self.artifact.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install a freshly acquired capture, clearing everything from before
    pub fn install_capture(&mut self, session: CaptureSession) -> Displaced {
        self.generation += 1;
        self.is_recording = false;
        self.artifact = None;
        self.last_error = None;
        Displaced {
            capture: self.capture.replace(session),
            recording: self.recording.take(),
        }
    }

    /// The capture a new recording would bind to
    pub fn recordable_capture(&self) -> RecorderResult<&CaptureSession> {
        if self.is_recording {
            return Err(RecorderError::AlreadyRecording);
        }
        match &self.capture {
            None => Err(RecorderError::NoCaptureSession),
            Some(capture) if !capture.is_live() => Err(RecorderError::CaptureEnded),
            Some(capture) => Ok(capture),
        }
    }

    /// Claim the current capture for a new recording
    ///
    /// Returns the stream to encode and the ticket its artifact must present.
    /// The encoder can then be built without holding the state.
    pub fn reserve_recording(&mut self) -> RecorderResult<(MediaStream, RecordingTicket)> {
        let stream = self.recordable_capture()?.stream().clone();
        self.sequence += 1;
        let ticket = RecordingTicket {
            generation: self.generation,
            sequence: self.sequence,
        };
        Ok((stream, ticket))
    }

    /// Check that a reserved recording may still begin
    pub fn admit(&self, ticket: RecordingTicket) -> RecorderResult<()> {
        if ticket.generation != self.generation {
            return Err(RecorderError::Superseded);
        }
        self.recordable_capture().map(|_| ())
    }

    pub fn begin_recording(&mut self, session: RecordingSession) {
        self.recording = Some(session);
        self.is_recording = true;
    }

    /// Stop the active recording. None when nothing is recording.
    pub fn stop_recording(&mut self, policy: StopPolicy) -> Option<StopOutcome> {
        if !self.is_recording {
            return None;
        }
        self.is_recording = false;
        let pending = match self.recording.as_mut() {
            Some(recording) => recording.stop(),
            None => Err(RecorderError::NotRecording),
        };
        if pending.is_err() {
            // Its collector is gone; nothing will finalize
            self.recording = None;
        }
        let released = match policy {
            StopPolicy::ReleaseCapture => self.capture.take(),
            StopPolicy::KeepPreview => None,
        };
        Some(StopOutcome { pending, released })
    }

    /// Install a finalized artifact if it belongs to the current capture and
    /// no later recording has already been installed
    pub fn accept_artifact(&mut self, ticket: RecordingTicket, artifact: &RecordedArtifact) -> bool {
        if ticket.generation != self.generation || ticket.sequence <= self.artifact_sequence {
            return false;
        }
        self.artifact_sequence = ticket.sequence;
        self.artifact = Some(artifact.clone());
        true
    }

    pub fn record_error(&mut self, error: &AppError) {
        self.last_error = Some(ErrorResponse::from(error));
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            capture: self.capture.as_ref().map(CaptureSession::summary),
            recording: self.is_recording,
            recording_state: self.recording.as_ref().map(RecordingSession::state),
            artifact: self.artifact.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
