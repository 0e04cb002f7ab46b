//! View model for the recorder widget
//!
//! Decides which controls are shown and which previews are bound, given a
//! [`WidgetSnapshot`].

use crate::capture::CaptureSummary;
use crate::export::{Blob, ExportOptions, ObjectUrl, ObjectUrlRegistry};
use crate::recorder::ArtifactSummary;
use crate::utils::ErrorResponse;
use crate::widget::WidgetSnapshot;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// User actions exposed as buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlAction {
    NewCapture,
    StartRecording,
    StopRecording,
    Download,
}

/// Visual weight of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Emphasis {
    Primary,
    Secondary,
    Danger,
    Outlined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub action: ControlAction,
    pub label: String,
    pub emphasis: Emphasis,
}

/// Playback of the finished recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPreview {
    /// Object URL of the whole recording
    pub url: String,
    pub mime_type: String,
    pub artifact: ArtifactSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub controls: Vec<Control>,
    pub recording: bool,
    /// Live stream preview, present while a capture is held
    pub live_preview: Option<CaptureSummary>,
    pub playback: Option<PlaybackPreview>,
    pub error: Option<ErrorResponse>,
}

impl View {
    pub fn shows(&self, action: ControlAction) -> bool {
        self.controls.iter().any(|c| c.action == action)
    }
}

/// Builds [`View`]s and owns the playback object URL
pub struct PreviewPresenter {
    registry: Arc<ObjectUrlRegistry>,
    download_label: String,
    playback: Option<(Uuid, ObjectUrl)>,
}

impl PreviewPresenter {
    pub fn new(registry: Arc<ObjectUrlRegistry>, export: ExportOptions) -> Self {
        Self {
            registry,
            download_label: download_label(&export.file_name),
            playback: None,
        }
    }

    pub fn render(&mut self, snapshot: &WidgetSnapshot) -> View {
        let has_capture = snapshot.capture.is_some();

        let mut controls = vec![Control {
            action: ControlAction::NewCapture,
            label: "New Capture".to_string(),
            emphasis: Emphasis::Primary,
        }];
        if has_capture && !snapshot.recording {
            controls.push(Control {
                action: ControlAction::StartRecording,
                label: "Start Recording".to_string(),
                emphasis: Emphasis::Secondary,
            });
        }
        if snapshot.recording {
            controls.push(Control {
                action: ControlAction::StopRecording,
                label: "Stop Recording".to_string(),
                emphasis: Emphasis::Danger,
            });
        }
        controls.push(Control {
            action: ControlAction::Download,
            label: self.download_label.clone(),
            emphasis: Emphasis::Outlined,
        });

        View {
            controls,
            recording: snapshot.recording,
            live_preview: snapshot.capture.clone(),
            playback: self.sync_playback(snapshot),
            error: snapshot.last_error.clone(),
        }
    }

    /// Keep one object URL alive for the current artifact and revoke the rest
    fn sync_playback(&mut self, snapshot: &WidgetSnapshot) -> Option<PlaybackPreview> {
        let artifact = match &snapshot.artifact {
            Some(artifact) if !artifact.is_empty() => artifact,
            _ => {
                self.release_playback();
                return None;
            }
        };

        let current = matches!(&self.playback, Some((id, _)) if *id == artifact.id());
        if !current {
            self.release_playback();
            let blob = Blob::from_chunks(artifact.chunks(), artifact.mime_type());
            self.playback = Some((artifact.id(), self.registry.create(blob)));
        }
        let url = self
            .playback
            .as_ref()
            .map(|(_, url)| url.clone())?;

        Some(PlaybackPreview {
            url: url.to_string(),
            mime_type: artifact.mime_type().to_string(),
            artifact: artifact.summary(),
        })
    }

    fn release_playback(&mut self) {
        if let Some((_, url)) = self.playback.take() {
            self.registry.revoke(&url);
        }
    }
}

impl Drop for PreviewPresenter {
    fn drop(&mut self) {
        self.release_playback();
    }
}

fn download_label(file_name: &str) -> String {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("Download Video ({})", ext.to_uppercase()),
        _ => "Download Video".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecordedArtifact;
    use chrono::Utc;

    fn presenter() -> (PreviewPresenter, Arc<ObjectUrlRegistry>) {
        let registry = Arc::new(ObjectUrlRegistry::new());
        (
            PreviewPresenter::new(registry.clone(), ExportOptions::default()),
            registry,
        )
    }

    fn capture_summary() -> CaptureSummary {
        CaptureSummary {
            stream_id: Uuid::new_v4(),
            video_tracks: vec!["Display".to_string()],
            audio_tracks: vec!["Microphone".to_string()],
            acquired_at: Utc::now(),
            live: true,
        }
    }

    fn actions(view: &View) -> Vec<ControlAction> {
        view.controls.iter().map(|c| c.action).collect()
    }

    #[test]
    fn test_initial_view() {
        let (mut presenter, _) = presenter();
        let view = presenter.render(&WidgetSnapshot::default());
        assert_eq!(actions(&view), vec![ControlAction::NewCapture, ControlAction::Download]);
        assert_eq!(view.controls[1].label, "Download Video (MP4)");
        assert!(view.live_preview.is_none());
        assert!(view.playback.is_none());
    }

    #[test]
    fn test_capturing_shows_start() {
        let (mut presenter, _) = presenter();
        let snapshot = WidgetSnapshot {
            capture: Some(capture_summary()),
            ..WidgetSnapshot::default()
        };
        let view = presenter.render(&snapshot);
        assert!(view.shows(ControlAction::StartRecording));
        assert!(!view.shows(ControlAction::StopRecording));
        assert!(view.live_preview.is_some());
    }

    #[test]
    fn test_recording_shows_stop_only() {
        let (mut presenter, _) = presenter();
        let snapshot = WidgetSnapshot {
            capture: Some(capture_summary()),
            recording: true,
            ..WidgetSnapshot::default()
        };
        let view = presenter.render(&snapshot);
        assert!(!view.shows(ControlAction::StartRecording));
        assert!(view.shows(ControlAction::StopRecording));
    }

    #[test]
    fn test_playback_url_reused_and_revoked() {
        let (mut presenter, registry) = presenter();
        let artifact = RecordedArtifact::new(Uuid::new_v4(), "video/webm;codecs=vp8", vec![vec![1; 5]]);
        let snapshot = WidgetSnapshot {
            artifact: Some(artifact),
            ..WidgetSnapshot::default()
        };

        let first = presenter.render(&snapshot).playback.unwrap();
        let second = presenter.render(&snapshot).playback.unwrap();
        assert_eq!(first.url, second.url);
        assert_eq!(first.mime_type, "video/webm;codecs=vp8");
        assert_eq!(registry.live_count(), 1);

        let replaced = WidgetSnapshot {
            artifact: Some(RecordedArtifact::new(Uuid::new_v4(), "video/webm", vec![vec![2; 5]])),
            ..WidgetSnapshot::default()
        };
        let third = presenter.render(&replaced).playback.unwrap();
        assert_ne!(third.url, first.url);
        assert_eq!(registry.live_count(), 1);

        presenter.render(&WidgetSnapshot::default());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_empty_artifact_has_no_playback() {
        let (mut presenter, registry) = presenter();
        let snapshot = WidgetSnapshot {
            artifact: Some(RecordedArtifact::new(Uuid::new_v4(), "video/webm", Vec::new())),
            ..WidgetSnapshot::default()
        };
        assert!(presenter.render(&snapshot).playback.is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_download_label_follows_extension() {
        assert_eq!(download_label("clip.webm"), "Download Video (WEBM)");
        assert_eq!(download_label("clip"), "Download Video");
    }
}
