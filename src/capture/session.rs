//! Capture session lifetime

use super::traits::{MediaKind, MediaStream};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// A live combined screen + microphone stream
///
/// Dropping the session releases its tracks.
#[derive(Debug)]
pub struct CaptureSession {
    stream: MediaStream,
    acquired_at: DateTime<Utc>,
    released: AtomicBool,
}

/// Presentation summary of a capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    pub stream_id: Uuid,
    pub video_tracks: Vec<String>,
    pub audio_tracks: Vec<String>,
    pub acquired_at: DateTime<Utc>,
    pub live: bool,
}

impl CaptureSession {
    pub fn new(stream: MediaStream) -> Self {
        Self {
            stream,
            acquired_at: Utc::now(),
            released: AtomicBool::new(false),
        }
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub fn id(&self) -> Uuid {
        self.stream.id()
    }

    /// Not yet released and at least one track still live
    pub fn is_live(&self) -> bool {
        !self.released.load(Ordering::Acquire) && self.stream.is_active()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Stop every track. Returns false if the session was already released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.stream.stop_all();
        tracing::info!(
            "Released capture session {} ({} tracks)",
            self.id(),
            self.stream.tracks().len()
        );
        true
    }

    pub fn summary(&self) -> CaptureSummary {
        let labels = |kind: MediaKind| -> Vec<String> {
            self.stream
                .tracks_of(kind)
                .map(|t| t.label().to_string())
                .collect()
        };
        CaptureSummary {
            stream_id: self.id(),
            video_tracks: labels(MediaKind::Video),
            audio_tracks: labels(MediaKind::Audio),
            acquired_at: self.acquired_at,
            live: self.is_live(),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::synthetic::SyntheticTrack;
    use crate::capture::MediaTrack;
    use std::sync::Arc;

    fn session_with_tracks() -> (CaptureSession, Vec<Arc<SyntheticTrack>>) {
        let video = Arc::new(SyntheticTrack::new(MediaKind::Video, "Display 1"));
        let audio = Arc::new(SyntheticTrack::new(MediaKind::Audio, "Microphone"));
        let tracks: Vec<Arc<dyn MediaTrack>> = vec![video.clone(), audio.clone()];
        (CaptureSession::new(MediaStream::new(tracks)), vec![video, audio])
    }

    #[test]
    fn test_release_stops_every_track() {
        let (session, tracks) = session_with_tracks();
        assert!(session.is_live());

        assert!(session.release());
        assert!(tracks.iter().all(|t| !t.is_live()));
        assert!(!session.is_live());
    }

    #[test]
    fn test_release_is_idempotent() {
        let (session, tracks) = session_with_tracks();
        assert!(session.release());
        assert!(!session.release());
        assert_eq!(tracks[0].stop_count(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let (session, tracks) = session_with_tracks();
        drop(session);
        assert!(tracks.iter().all(|t| !t.is_live()));
    }

    #[test]
    fn test_ended_tracks_make_session_dead() {
        let (session, tracks) = session_with_tracks();
        tracks[0].end();
        assert!(session.is_live());
        tracks[1].end();
        assert!(!session.is_live());
        assert!(!session.is_released());
    }

    #[test]
    fn test_summary_lists_tracks_by_kind() {
        let (session, _tracks) = session_with_tracks();
        let summary = session.summary();
        assert_eq!(summary.video_tracks, vec!["Display 1".to_string()]);
        assert_eq!(summary.audio_tracks, vec!["Microphone".to_string()]);
        assert!(summary.live);
    }
}
