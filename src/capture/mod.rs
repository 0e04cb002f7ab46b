//! Capture session management
//!
//! This module acquires screen and microphone streams from the host and owns
//! their lifetime.

pub mod manager;
pub mod session;
pub mod synthetic;
pub mod traits;

pub use manager::{acquire_capture, CaptureConstraints};
pub use session::{CaptureSession, CaptureSummary};
pub use traits::{
    AudioConstraints, CaptureError, CaptureResult, DisplayConstraints, MediaDevices, MediaKind,
    MediaStream, MediaTrack,
};
