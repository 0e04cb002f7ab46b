//! Screen recorder widget
//!
//! [`ScreenRecorder`] exposes the user-triggered operations (new capture,
//! start/stop recording, download) over a shared [`WidgetState`].

pub mod state;

pub use state::{RecordingTicket, WidgetSnapshot, WidgetState};

use crate::capture::{acquire_capture, CaptureSummary, MediaDevices};
use crate::config::RecorderConfig;
use crate::export::{ArtifactExporter, DownloadOutcome, DownloadSink, ObjectUrlRegistry};
use crate::presenter::PreviewPresenter;
use crate::recorder::{
    EncoderFactory, FinalizeHook, PendingArtifact, RecordedArtifact, RecorderError,
    RecordingSession,
};
use crate::utils::{AppError, AppResult};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

pub struct ScreenRecorder {
    config: RecorderConfig,
    devices: Arc<dyn MediaDevices>,
    encoders: Arc<dyn EncoderFactory>,
    exporter: ArtifactExporter,
    registry: Arc<ObjectUrlRegistry>,
    state: Arc<Mutex<WidgetState>>,
}

impl ScreenRecorder {
    pub fn new(
        config: RecorderConfig,
        devices: Arc<dyn MediaDevices>,
        encoders: Arc<dyn EncoderFactory>,
        sink: Arc<dyn DownloadSink>,
    ) -> AppResult<Self> {
        config.validate()?;
        let registry = Arc::new(ObjectUrlRegistry::new());
        let exporter = ArtifactExporter::new(config.export.clone(), registry.clone(), sink);
        Ok(Self {
            config,
            devices,
            encoders,
            exporter,
            registry,
            state: Arc::new(Mutex::new(WidgetState::new())),
        })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Request microphone and screen, and replace any previous capture
    ///
    /// On failure nothing is installed and the previous capture, recording and
    /// artifact are left as they were.
    pub async fn start_capture(&self) -> AppResult<CaptureSummary> {
        let session = match acquire_capture(self.devices.as_ref(), &self.config.capture).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Error capturing screen: {}", e);
                let err = AppError::from(e);
                self.state.lock().record_error(&err);
                return Err(err);
            }
        };

        let summary = session.summary();
        let displaced = self.state.lock().install_capture(session);
        displaced.teardown();

        tracing::info!("Capture {} installed", summary.stream_id);
        Ok(summary)
    }

    /// Start encoding the current capture
    ///
    /// The encoder is created and started without holding the widget state.
    pub fn start_recording(&self) -> AppResult<Uuid> {
        let reserved = self.state.lock().reserve_recording();
        let (stream, ticket) = match reserved {
            Ok(reserved) => reserved,
            Err(e) => return Err(self.recording_failed(e)),
        };

        let weak = Arc::downgrade(&self.state);
        let on_finalized: FinalizeHook = Box::new(move |artifact: &RecordedArtifact| {
            let Some(state) = weak.upgrade() else {
                return false;
            };
            let accepted = state.lock().accept_artifact(ticket, artifact);
            accepted
        });

        let recording = match RecordingSession::start(
            &stream,
            self.encoders.as_ref(),
            &self.config.encoder,
            on_finalized,
        ) {
            Ok(recording) => recording,
            Err(e) => return Err(self.recording_failed(e)),
        };

        let mut state = self.state.lock();
        match state.admit(ticket) {
            Ok(()) => {
                let id = recording.id();
                state.begin_recording(recording);
                Ok(id)
            }
            Err(e) => {
                drop(state);
                // The capture changed while the encoder was starting
                recording.abort();
                Err(self.recording_failed(e))
            }
        }
    }

    fn recording_failed(&self, e: RecorderError) -> AppError {
        tracing::error!("Error starting recording: {}", e);
        let err = AppError::from(e);
        self.state.lock().record_error(&err);
        err
    }

    /// Stop the active recording
    ///
    /// The widget leaves the recording state immediately. The returned future
    /// resolves once the encoder has flushed and the artifact is installed.
    /// Returns `Ok(None)` when nothing is recording.
    pub fn stop_recording(&self) -> AppResult<Option<PendingArtifact>> {
        let outcome = self.state.lock().stop_recording(self.config.stop_policy);
        let Some(outcome) = outcome else {
            tracing::debug!("Stop requested with no active recording");
            return Ok(None);
        };

        if let Some(capture) = outcome.released {
            capture.release();
        }

        match outcome.pending {
            Ok(pending) => Ok(Some(pending)),
            Err(e) => {
                tracing::error!("Error stopping recording: {}", e);
                let err = AppError::from(e);
                self.state.lock().record_error(&err);
                Err(err)
            }
        }
    }

    /// Save the current artifact under the configured file name
    pub fn download_artifact(&self) -> AppResult<DownloadOutcome> {
        let artifact = self.state.lock().artifact().cloned();
        self.exporter.download(artifact.as_ref()).map_err(|e| {
            tracing::error!("Error downloading recording: {}", e);
            let err = AppError::from(e);
            self.state.lock().record_error(&err);
            err
        })
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        self.state.lock().snapshot()
    }

    /// A presenter sharing this widget's object URL registry
    pub fn presenter(&self) -> PreviewPresenter {
        PreviewPresenter::new(self.registry.clone(), self.config.export.clone())
    }
}
