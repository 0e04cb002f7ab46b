//! Client-side download of a recorded artifact
//!
//! The artifact is concatenated into a blob, exposed through a transient
//! object URL, handed to a [`DownloadSink`] (the equivalent of clicking a
//! download link), and the URL is revoked right after.

use super::blob::{Blob, ObjectUrl, ObjectUrlRegistry};
use super::types::{DownloadOutcome, ExportOptions, ExportResult, SavedFile};
use crate::recorder::RecordedArtifact;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A save action triggered by the exporter
pub struct DownloadRequest<'a> {
    /// Transient URL of the payload; valid only for the duration of `save`
    pub url: &'a ObjectUrl,
    pub file_name: &'a str,
    pub registry: &'a ObjectUrlRegistry,
}

/// Receives save actions
pub trait DownloadSink: Send + Sync {
    fn save(&self, request: &DownloadRequest<'_>) -> ExportResult<SavedFile>;
}

/// Saves downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, request: &DownloadRequest<'_>) -> ExportResult<SavedFile> {
        let blob = request.registry.resolve(request.url)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write next to the target and rename so readers never see a partial file
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob.bytes())?;
        tmp.flush()?;
        let path = self.dir.join(request.file_name);
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::info!("Saved {} bytes to {:?}", blob.len(), path);
        Ok(SavedFile {
            uri: file_uri(&path),
            path,
            bytes: blob.len(),
        })
    }
}

fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let encoded: Vec<String> = absolute
        .to_string_lossy()
        .split(['/', '\\'])
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let joined = encoded.join("/");
    if joined.starts_with('/') {
        format!("file://{}", joined)
    } else {
        format!("file:///{}", joined)
    }
}

/// Turns artifacts into downloads
pub struct ArtifactExporter {
    options: ExportOptions,
    registry: Arc<ObjectUrlRegistry>,
    sink: Arc<dyn DownloadSink>,
}

impl ArtifactExporter {
    pub fn new(
        options: ExportOptions,
        registry: Arc<ObjectUrlRegistry>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        Self {
            options,
            registry,
            sink,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Save the artifact under the configured file name
    ///
    /// An empty or missing artifact logs a warning and triggers no save.
    pub fn download(&self, artifact: Option<&RecordedArtifact>) -> ExportResult<DownloadOutcome> {
        let artifact = match artifact {
            Some(a) if !a.is_empty() => a,
            _ => {
                tracing::warn!("No recorded data available for download.");
                return Ok(DownloadOutcome::Skipped);
            }
        };

        let blob = Blob::from_chunks(artifact.chunks(), self.options.content_type.as_str());
        let url = self.registry.create(blob);
        let result = self.sink.save(&DownloadRequest {
            url: &url,
            file_name: &self.options.file_name,
            registry: &self.registry,
        });
        self.registry.revoke(&url);

        let saved = result?;
        tracing::info!(
            "Downloaded recording {} as {}",
            artifact.recording_id(),
            self.options.file_name
        );
        Ok(DownloadOutcome::Saved(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportError;
    use parking_lot::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct CollectingSink {
        saves: Mutex<Vec<(String, Blob)>>,
    }

    impl DownloadSink for CollectingSink {
        fn save(&self, request: &DownloadRequest<'_>) -> ExportResult<SavedFile> {
            let blob = request.registry.resolve(request.url)?;
            let bytes = blob.len();
            self.saves.lock().push((request.file_name.to_string(), blob));
            Ok(SavedFile {
                path: PathBuf::from(request.file_name),
                uri: request.url.to_string(),
                bytes,
            })
        }
    }

    struct FailingSink;

    impl DownloadSink for FailingSink {
        fn save(&self, _request: &DownloadRequest<'_>) -> ExportResult<SavedFile> {
            Err(ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn artifact(chunks: Vec<Vec<u8>>) -> RecordedArtifact {
        RecordedArtifact::new(Uuid::new_v4(), "video/webm;codecs=vp8", chunks)
    }

    #[test]
    fn test_empty_artifact_is_skipped() {
        let sink = Arc::new(CollectingSink::default());
        let registry = Arc::new(ObjectUrlRegistry::new());
        let exporter = ArtifactExporter::new(ExportOptions::default(), registry.clone(), sink.clone());

        assert_eq!(exporter.download(None).unwrap(), DownloadOutcome::Skipped);
        assert_eq!(
            exporter.download(Some(&artifact(Vec::new()))).unwrap(),
            DownloadOutcome::Skipped
        );
        assert!(sink.saves.lock().is_empty());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_download_saves_concatenated_payload() {
        let sink = Arc::new(CollectingSink::default());
        let registry = Arc::new(ObjectUrlRegistry::new());
        let exporter = ArtifactExporter::new(ExportOptions::default(), registry.clone(), sink.clone());

        let outcome = exporter
            .download(Some(&artifact(vec![vec![1; 10], vec![2; 20]])))
            .unwrap();
        assert!(matches!(outcome, DownloadOutcome::Saved(ref f) if f.bytes == 30));

        let saves = sink.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "recorded-video.mp4");
        assert_eq!(saves[0].1.content_type(), "video/webm");
        assert_eq!(&saves[0].1.bytes()[..10], &[1; 10]);
        assert_eq!(&saves[0].1.bytes()[10..], &[2; 20]);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_url_revoked_when_save_fails() {
        let registry = Arc::new(ObjectUrlRegistry::new());
        let exporter =
            ArtifactExporter::new(ExportOptions::default(), registry.clone(), Arc::new(FailingSink));

        assert!(exporter.download(Some(&artifact(vec![vec![1; 4]]))).is_err());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ObjectUrlRegistry::new());
        let exporter = ArtifactExporter::new(
            ExportOptions {
                file_name: "my recording.mp4".to_string(),
                ..ExportOptions::default()
            },
            registry,
            Arc::new(DirectorySink::new(dir.path())),
        );

        let outcome = exporter
            .download(Some(&artifact(vec![b"abc".to_vec(), b"def".to_vec()])))
            .unwrap();
        let DownloadOutcome::Saved(saved) = outcome else {
            panic!("expected a saved file");
        };
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"abcdef");
        assert!(saved.uri.starts_with("file://"));
        assert!(saved.uri.ends_with("my%20recording.mp4"));
    }
}
