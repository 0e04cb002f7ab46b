//! Synthetic capture backend
//!
//! In-process stand-ins for the platform's microphone and display sources.
//! Used by the headless binary and by tests.

use super::traits::{
    AudioConstraints, CaptureError, CaptureResult, DisplayConstraints, MediaDevices, MediaKind,
    MediaStream, MediaTrack,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A track that is live until stopped or ended
#[derive(Debug)]
pub struct SyntheticTrack {
    id: String,
    kind: MediaKind,
    label: String,
    live: AtomicBool,
    stops: AtomicUsize,
}

impl SyntheticTrack {
    pub fn new(kind: MediaKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            live: AtomicBool::new(true),
            stops: AtomicUsize::new(0),
        }
    }

    /// Simulate the source going away (e.g. the user ends screen sharing)
    pub fn end(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Number of times `stop` actually stopped the track
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::Acquire)
    }
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            self.stops.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Synthetic microphone and display picker
#[derive(Debug, Default)]
pub struct SyntheticDevices {
    deny_microphone: AtomicBool,
    deny_display: AtomicBool,
    cancel_display: AtomicBool,
    display_requests: AtomicUsize,
    issued: Mutex<Vec<Arc<SyntheticTrack>>>,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next microphone requests with a permission error
    pub fn deny_microphone(&self, deny: bool) {
        self.deny_microphone.store(deny, Ordering::Release);
    }

    /// Reject the next display requests with a permission error
    pub fn deny_display(&self, deny: bool) {
        self.deny_display.store(deny, Ordering::Release);
    }

    /// Behave as if the user closed the display picker without choosing
    pub fn cancel_display_picker(&self, cancel: bool) {
        self.cancel_display.store(cancel, Ordering::Release);
    }

    pub fn display_requests(&self) -> usize {
        self.display_requests.load(Ordering::Acquire)
    }

    /// Every track handed out so far, in issue order
    pub fn issued_tracks(&self) -> Vec<Arc<SyntheticTrack>> {
        self.issued.lock().clone()
    }

    fn issue(&self, kind: MediaKind, label: &str) -> MediaStream {
        let track = Arc::new(SyntheticTrack::new(kind, label));
        self.issued.lock().push(track.clone());
        MediaStream::new(vec![track as Arc<dyn MediaTrack>])
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(&self, constraints: &AudioConstraints) -> CaptureResult<MediaStream> {
        if self.deny_microphone.load(Ordering::Acquire) {
            return Err(CaptureError::PermissionDenied {
                kind: MediaKind::Audio,
                reason: "NotAllowedError".to_string(),
            });
        }
        let label = constraints
            .device_id
            .as_deref()
            .unwrap_or("Synthetic Microphone");
        Ok(self.issue(MediaKind::Audio, label))
    }

    async fn get_display_media(
        &self,
        _constraints: &DisplayConstraints,
    ) -> CaptureResult<MediaStream> {
        self.display_requests.fetch_add(1, Ordering::AcqRel);
        if self.deny_display.load(Ordering::Acquire) {
            return Err(CaptureError::PermissionDenied {
                kind: MediaKind::Video,
                reason: "NotAllowedError".to_string(),
            });
        }
        if self.cancel_display.load(Ordering::Acquire) {
            return Err(CaptureError::NoDisplaySelected);
        }
        Ok(self.issue(MediaKind::Video, "Synthetic Display"))
    }
}
