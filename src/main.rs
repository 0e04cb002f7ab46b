//! Headless driver for the recorder widget using the synthetic backend.

use anyhow::Context;
use clap::Parser;
use screen_recorder::capture::synthetic::SyntheticDevices;
use screen_recorder::export::DirectorySink;
use screen_recorder::recorder::synthetic::SyntheticEncoderFactory;
use screen_recorder::{init_tracing, RecorderConfig, ScreenRecorder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "screen-recorder")]
#[command(version)]
#[command(about = "Capture, record and download a synthetic screen recording")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to save the download into (overrides the config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// How long to record, in milliseconds
    #[arg(long, default_value_t = 2000)]
    duration_ms: u64,

    /// Size of each synthetic encoded chunk in bytes
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,

    /// Simulate a denied microphone permission
    #[arg(long, action = clap::ArgAction::SetTrue)]
    deny_microphone: bool,

    /// Simulate closing the display picker without a selection
    #[arg(long, action = clap::ArgAction::SetTrue)]
    cancel_display: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RecorderConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RecorderConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.download_dir = dir;
    }
    if config.encoder.timeslice_ms.is_none() {
        config.encoder.timeslice_ms = Some(250);
    }

    let devices = Arc::new(SyntheticDevices::new());
    devices.deny_microphone(args.deny_microphone);
    devices.cancel_display_picker(args.cancel_display);

    let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
    let recorder = ScreenRecorder::new(
        config,
        devices,
        Arc::new(SyntheticEncoderFactory::timesliced(args.chunk_size)),
        sink,
    )?;
    let mut presenter = recorder.presenter();

    recorder.start_capture().await?;
    println!("{}", serde_json::to_string_pretty(&presenter.render(&recorder.snapshot()))?);

    recorder.start_recording()?;
    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;

    if let Some(pending) = recorder.stop_recording()? {
        let artifact = pending.await?;
        tracing::info!(
            "Recorded {} chunks ({} bytes)",
            artifact.chunk_count(),
            artifact.byte_len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&presenter.render(&recorder.snapshot()))?);

    let outcome = recorder.download_artifact()?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
