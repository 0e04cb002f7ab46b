//! Screen Recorder - capture the screen and microphone, record, preview, download.
//!
//! The host's capture, encoding and file-save capabilities sit behind traits
//! ([`capture::MediaDevices`], [`recorder::EncoderFactory`],
//! [`export::DownloadSink`]); [`widget::ScreenRecorder`] drives the
//! capture → record → stop → download lifecycle over them.

pub mod capture;
pub mod config;
pub mod export;
pub mod presenter;
pub mod recorder;
pub mod utils;
pub mod widget;

pub use config::{RecorderConfig, StopPolicy};
pub use utils::{AppError, AppResult, ErrorResponse};
pub use widget::ScreenRecorder;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_tracing() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Starting Screen Recorder v{}", env!("CARGO_PKG_VERSION"));
    }
}
