//! Capture trait definitions
//!
//! Platform-agnostic traits for the host's media capture capabilities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Capture acquisition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied for {kind} capture: {reason}")]
    PermissionDenied { kind: MediaKind, reason: String },

    #[error("No display source was selected")]
    NoDisplaySelected,

    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// A single live media track handed out by the platform
///
/// Stopping a track is permanent and must be idempotent.
pub trait MediaTrack: Send + Sync {
    /// Platform track identifier
    fn id(&self) -> &str;

    /// Audio or video
    fn kind(&self) -> MediaKind;

    /// Human readable source label (device or display name)
    fn label(&self) -> &str;

    /// Whether the track is still producing media
    fn is_live(&self) -> bool;

    /// Stop the track and release the underlying source
    fn stop(&self);
}

/// An ordered set of tracks
#[derive(Clone)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    /// Merge the tracks of several streams, preserving order
    pub fn combine<I>(streams: I) -> Self
    where
        I: IntoIterator<Item = MediaStream>,
    {
        Self::new(streams.into_iter().flat_map(|s| s.tracks).collect())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// True while at least one track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Stop every track in the stream
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field(
                "tracks",
                &self
                    .tracks
                    .iter()
                    .map(|t| format!("{}:{}", t.kind(), t.id()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Constraints for a microphone request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraints {
    /// Preferred input device (None = platform default)
    pub device_id: Option<String>,
}

/// Constraints for a display request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConstraints {
    /// Upper bound on capture frame rate
    pub frame_rate: Option<u32>,
}

/// The host's permissioned capture entry points
///
/// Both requests may suspend while the user answers a permission prompt.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request microphone audio
    async fn get_user_media(&self, constraints: &AudioConstraints) -> CaptureResult<MediaStream>;

    /// Request a display source picked by the user
    async fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> CaptureResult<MediaStream>;
}
