//! Recording system module
//!
//! - MediaEncoder / EncoderFactory: the encoder boundary
//! - RecordingSession: one encoder over a capture stream and its chunk collector
//! - RecordedArtifact: the finalized chunk sequence

pub mod encoder;
pub mod session;
pub mod state;
pub mod synthetic;

pub use encoder::{EncoderEvent, EncoderEventSender, EncoderFactory, EncoderOptions, MediaEncoder};
pub use session::{FinalizeHook, PendingArtifact, RecordingSession};
pub use state::{ArtifactSummary, RecordedArtifact, RecorderError, RecorderResult, RecordingState};
