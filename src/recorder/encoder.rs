//! Encoder boundary
//!
//! The platform encoder is constructed over a stream and reports its output
//! through [`EncoderEvent`]s sent on a channel.

use super::state::RecorderResult;
use crate::capture::MediaStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Events raised by a running encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A chunk of encoded data. May be empty.
    DataAvailable(Vec<u8>),
    /// A non-fatal encoder error
    Error(String),
    /// The encoder flushed its last chunk and stopped
    Stopped,
}

pub type EncoderEventSender = mpsc::UnboundedSender<EncoderEvent>;
pub type EncoderEventReceiver = mpsc::UnboundedReceiver<EncoderEvent>;

/// Encoder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncoderOptions {
    /// Preferred MIME type; the encoder may pick its own when None
    pub mime_type: Option<String>,
    /// Emit a chunk every `timeslice_ms` instead of only on stop
    pub timeslice_ms: Option<u64>,
}

impl EncoderOptions {
    pub fn timeslice(&self) -> Option<Duration> {
        self.timeslice_ms.map(Duration::from_millis)
    }
}

/// A running encoder bound to one stream
pub trait MediaEncoder: Send {
    /// MIME type of the produced data
    fn mime_type(&self) -> &str;

    /// Begin encoding
    fn start(&mut self, timeslice: Option<Duration>) -> RecorderResult<()>;

    /// Request a flush; `EncoderEvent::Stopped` follows the final chunk
    fn stop(&mut self) -> RecorderResult<()>;
}

/// Constructs encoders over a stream
pub trait EncoderFactory: Send + Sync {
    fn create(
        &self,
        stream: &MediaStream,
        options: &EncoderOptions,
        events: EncoderEventSender,
    ) -> RecorderResult<Box<dyn MediaEncoder>>;
}
