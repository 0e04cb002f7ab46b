//! Recording session
//!
//! Binds an encoder to a capture stream, collects its chunks on a background
//! task, and hands the finalized artifact back through [`PendingArtifact`].

use super::encoder::{EncoderEvent, EncoderEventReceiver, EncoderFactory, EncoderOptions, MediaEncoder};
use super::state::{RecordedArtifact, RecorderError, RecorderResult, RecordingState};
use crate::capture::MediaStream;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Called with the artifact once the encoder has stopped. Returns whether the
/// artifact was accepted; rejected artifacts resolve as `Superseded`.
pub type FinalizeHook = Box<dyn FnOnce(&RecordedArtifact) -> bool + Send>;

/// Ordered buffer of non-empty chunks
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Zero-length chunks are dropped.
    pub fn push(&mut self, data: Vec<u8>) -> bool {
        if data.is_empty() {
            return false;
        }
        self.chunks.push(data);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn into_chunks(self) -> Vec<Vec<u8>> {
        self.chunks
    }
}

/// Resolves once the encoder's stop event has produced the artifact
#[must_use = "the artifact is only observable by awaiting PendingArtifact"]
#[derive(Debug)]
pub struct PendingArtifact {
    recording_id: Uuid,
    rx: oneshot::Receiver<RecorderResult<RecordedArtifact>>,
}

impl PendingArtifact {
    pub fn recording_id(&self) -> Uuid {
        self.recording_id
    }
}

impl Future for PendingArtifact {
    type Output = RecorderResult<RecordedArtifact>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(RecorderError::EncoderAborted)))
    }
}

/// An encoder running over a capture stream
pub struct RecordingSession {
    id: Uuid,
    encoder: Box<dyn MediaEncoder>,
    state: RecordingState,
    started_at: DateTime<Utc>,
    finished: Option<oneshot::Receiver<RecorderResult<RecordedArtifact>>>,
    /// Ends the collector early when the encoder can no longer deliver a stop
    cancel: Option<oneshot::Sender<()>>,
}

impl RecordingSession {
    /// Create and start an encoder over a capture's combined stream
    ///
    /// Must be called from within a tokio runtime; the chunk collector runs as
    /// a spawned task.
    pub fn start(
        stream: &MediaStream,
        factory: &dyn EncoderFactory,
        options: &EncoderOptions,
        on_finalized: FinalizeHook,
    ) -> RecorderResult<Self> {
        if !stream.is_active() {
            return Err(RecorderError::CaptureEnded);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RecorderError::Encoder(format!("no async runtime: {}", e)))?;

        let id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut encoder = factory.create(stream, options, events_tx)?;
        encoder.start(options.timeslice())?;

        let (done_tx, done_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        runtime.spawn(collect_chunks(
            id,
            encoder.mime_type().to_string(),
            events_rx,
            cancel_rx,
            on_finalized,
            done_tx,
        ));

        tracing::info!(
            "Recording {} started on stream {} ({})",
            id,
            stream.id(),
            encoder.mime_type()
        );

        Ok(Self {
            id,
            encoder,
            state: RecordingState::Recording,
            started_at: Utc::now(),
            finished: Some(done_rx),
            cancel: Some(cancel_tx),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Ask the encoder to flush and stop
    ///
    /// If the encoder refuses, the collector is shut down and no artifact
    /// will be produced.
    pub fn stop(&mut self) -> RecorderResult<PendingArtifact> {
        if self.state != RecordingState::Recording {
            return Err(RecorderError::NotRecording);
        }
        self.state = RecordingState::Stopped;
        if let Err(e) = self.encoder.stop() {
            self.cancel_collector();
            self.finished = None;
            return Err(e);
        }

        let elapsed = Utc::now() - self.started_at;
        tracing::info!(
            "Recording {} stopping after {}ms",
            self.id,
            elapsed.num_milliseconds()
        );

        let rx = self.finished.take().ok_or(RecorderError::NotRecording)?;
        Ok(PendingArtifact {
            recording_id: self.id,
            rx,
        })
    }

    /// Stop without waiting for the artifact
    pub fn abort(mut self) {
        if self.state != RecordingState::Recording {
            return;
        }
        self.state = RecordingState::Stopped;
        if let Err(e) = self.encoder.stop() {
            tracing::warn!("Failed to stop encoder for recording {}: {}", self.id, e);
            self.cancel_collector();
        }
    }

    fn cancel_collector(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

async fn collect_chunks(
    recording_id: Uuid,
    mime_type: String,
    mut events: EncoderEventReceiver,
    mut cancel: oneshot::Receiver<()>,
    on_finalized: FinalizeHook,
    done: oneshot::Sender<RecorderResult<RecordedArtifact>>,
) {
    let mut buffer = ChunkBuffer::new();
    // A dropped session without an explicit cancel keeps collecting
    let mut cancellable = true;
    loop {
        let event = tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            cancelled = &mut cancel, if cancellable => {
                if cancelled.is_ok() {
                    tracing::warn!("Collector for recording {} cancelled", recording_id);
                    let _ = done.send(Err(RecorderError::EncoderAborted));
                    return;
                }
                cancellable = false;
                continue;
            }
        };
        match event {
            EncoderEvent::DataAvailable(data) => {
                let size = data.len();
                if !buffer.push(data) {
                    tracing::trace!("Skipping empty chunk for recording {}", recording_id);
                } else {
                    tracing::trace!("Recording {} chunk {} ({} bytes)", recording_id, buffer.len(), size);
                }
            }
            EncoderEvent::Error(message) => {
                tracing::error!("Encoder error in recording {}: {}", recording_id, message);
            }
            EncoderEvent::Stopped => {
                let artifact = RecordedArtifact::new(recording_id, mime_type, buffer.into_chunks());
                tracing::info!(
                    "Recording {} finalized: {} chunks, {} bytes",
                    recording_id,
                    artifact.chunk_count(),
                    artifact.byte_len()
                );
                let result = if on_finalized(&artifact) {
                    Ok(artifact)
                } else {
                    tracing::debug!("Discarding superseded recording {}", recording_id);
                    Err(RecorderError::Superseded)
                };
                let _ = done.send(result);
                return;
            }
        }
    }

    tracing::warn!("Encoder for recording {} closed without stopping", recording_id);
    let _ = done.send(Err(RecorderError::EncoderAborted));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_skips_empty_chunks() {
        let mut buffer = ChunkBuffer::new();
        assert!(buffer.push(vec![1; 10]));
        assert!(!buffer.push(Vec::new()));
        assert!(buffer.push(vec![2; 20]));

        let chunks = buffer.into_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 20);
    }

    #[tokio::test]
    async fn test_collector_finalizes_on_stopped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        let hook: FinalizeHook = Box::new(|_: &RecordedArtifact| true);
        let task = tokio::spawn(collect_chunks(Uuid::new_v4(), "video/webm".into(), rx, cancel_rx, hook, done_tx));

        tx.send(EncoderEvent::DataAvailable(vec![1, 2, 3])).unwrap();
        tx.send(EncoderEvent::Error("dropped frame".into())).unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![])).unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![4])).unwrap();
        tx.send(EncoderEvent::Stopped).unwrap();
        task.await.unwrap();

        let artifact = done_rx.await.unwrap().unwrap();
        assert_eq!(artifact.chunks().to_vec(), vec![vec![1u8, 2, 3], vec![4u8]]);
        assert_eq!(artifact.mime_type(), "video/webm");
    }

    #[tokio::test]
    async fn test_collector_reports_rejected_artifact() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        let hook: FinalizeHook = Box::new(|_: &RecordedArtifact| false);
        tokio::spawn(collect_chunks(Uuid::new_v4(), "video/webm".into(), rx, cancel_rx, hook, done_tx));

        tx.send(EncoderEvent::Stopped).unwrap();
        let result = done_rx.await.unwrap();
        assert!(matches!(result, Err(RecorderError::Superseded)));
    }

    #[tokio::test]
    async fn test_collector_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let hook: FinalizeHook = Box::new(|_: &RecordedArtifact| true);
        tokio::spawn(collect_chunks(Uuid::new_v4(), "video/webm".into(), rx, cancel_rx, hook, done_tx));

        // Dropping the cancel handle alone does not end collection
        drop(cancel_tx);
        tx.send(EncoderEvent::DataAvailable(vec![9])).unwrap();
        drop(tx);
        let result = done_rx.await.unwrap();
        assert!(matches!(result, Err(RecorderError::EncoderAborted)));
    }

    #[tokio::test]
    async fn test_cancelled_collector_releases_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let hook: FinalizeHook = Box::new(|_: &RecordedArtifact| true);
        let task = tokio::spawn(collect_chunks(Uuid::new_v4(), "video/webm".into(), rx, cancel_rx, hook, done_tx));

        tx.send(EncoderEvent::DataAvailable(vec![1])).unwrap();
        cancel_tx.send(()).unwrap();
        task.await.unwrap();

        assert!(matches!(done_rx.await.unwrap(), Err(RecorderError::EncoderAborted)));
        assert!(tx.is_closed());
    }
}
