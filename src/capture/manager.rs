//! Capture acquisition
//!
//! Requests the microphone and a display source and merges them into a
//! single [`CaptureSession`].

use super::session::CaptureSession;
use super::traits::{
    AudioConstraints, CaptureError, CaptureResult, DisplayConstraints, MediaDevices, MediaKind,
    MediaStream,
};
use serde::{Deserialize, Serialize};

/// What to ask the platform for when a capture starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConstraints {
    pub audio: AudioConstraints,
    pub display: DisplayConstraints,
}

/// Acquire microphone audio then screen video and merge them
///
/// The microphone prompt comes first. If it is granted but the display request
/// fails, the microphone tracks are stopped before the error is returned.
pub async fn acquire_capture(
    devices: &dyn MediaDevices,
    constraints: &CaptureConstraints,
) -> CaptureResult<CaptureSession> {
    tracing::debug!("Requesting microphone access");
    let audio = devices.get_user_media(&constraints.audio).await?;
    if audio.tracks_of(MediaKind::Audio).next().is_none() {
        audio.stop_all();
        return Err(CaptureError::DeviceUnavailable(
            "microphone request returned no audio track".to_string(),
        ));
    }

    tracing::debug!("Requesting display source");
    let screen = match devices.get_display_media(&constraints.display).await {
        Ok(stream) => stream,
        Err(e) => {
            audio.stop_all();
            return Err(e);
        }
    };
    if screen.tracks_of(MediaKind::Video).next().is_none() {
        audio.stop_all();
        screen.stop_all();
        return Err(CaptureError::NoDisplaySelected);
    }

    let combined = MediaStream::combine([screen, audio]);
    tracing::info!(
        "Acquired capture stream {} with {} tracks",
        combined.id(),
        combined.tracks().len()
    );
    Ok(CaptureSession::new(combined))
}
