//! Synthetic encoder backend
//!
//! Encoders that either produce fixed-size chunks on a timer or only emit what
//! is pushed through an [`EncoderTap`].

use super::encoder::{EncoderEvent, EncoderEventSender, EncoderFactory, EncoderOptions, MediaEncoder};
use super::state::{RecorderError, RecorderResult};
use crate::capture::MediaStream;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const DEFAULT_MIME_TYPE: &str = "video/webm;codecs=vp8,opus";
const DEFAULT_TIMESLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
enum Mode {
    Manual,
    Timesliced { chunk_size: usize },
}

/// Handle for pushing events into a manual encoder
#[derive(Debug, Clone)]
pub struct EncoderTap {
    events: EncoderEventSender,
    recording: Arc<AtomicBool>,
}

impl EncoderTap {
    /// Deliver a chunk as a "data available" event. Ignored once stopped.
    pub fn deliver(&self, data: impl Into<Vec<u8>>) -> bool {
        if !self.recording.load(Ordering::Acquire) {
            return false;
        }
        self.events.send(EncoderEvent::DataAvailable(data.into())).is_ok()
    }

    /// Report a non-fatal encoder error
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.events.send(EncoderEvent::Error(message.into())).is_ok()
    }

    /// Emit the stop event of an encoder created while stops were held
    pub fn finish(&self) -> bool {
        self.events.send(EncoderEvent::Stopped).is_ok()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// False once the chunk collector has gone away
    pub fn is_connected(&self) -> bool {
        !self.events.is_closed()
    }
}

/// Factory for synthetic encoders
#[derive(Debug)]
pub struct SyntheticEncoderFactory {
    mode: Mode,
    fail_on_create: AtomicBool,
    fail_on_stop: AtomicBool,
    hold_stop: AtomicBool,
    taps: Mutex<Vec<EncoderTap>>,
}

impl SyntheticEncoderFactory {
    /// Encoders that emit only what is delivered through their tap
    pub fn manual() -> Self {
        Self::with_mode(Mode::Manual)
    }

    /// Encoders that emit a `chunk_size` chunk every timeslice, plus a final
    /// chunk on stop
    pub fn timesliced(chunk_size: usize) -> Self {
        Self::with_mode(Mode::Timesliced { chunk_size })
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            fail_on_create: AtomicBool::new(false),
            fail_on_stop: AtomicBool::new(false),
            hold_stop: AtomicBool::new(false),
            taps: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent `create` calls fail
    pub fn fail_on_create(&self, fail: bool) {
        self.fail_on_create.store(fail, Ordering::Release);
    }

    /// Make encoders created from now on reject `stop`
    pub fn fail_on_stop(&self, fail: bool) {
        self.fail_on_stop.store(fail, Ordering::Release);
    }

    /// Encoders created from now on accept `stop` but only emit their stop
    /// event through [`EncoderTap::finish`]. Manual mode only.
    pub fn hold_stop(&self, hold: bool) {
        self.hold_stop.store(hold, Ordering::Release);
    }

    /// Tap of the most recently created encoder
    pub fn last_tap(&self) -> Option<EncoderTap> {
        self.taps.lock().last().cloned()
    }

    pub fn created(&self) -> usize {
        self.taps.lock().len()
    }
}

impl EncoderFactory for SyntheticEncoderFactory {
    fn create(
        &self,
        stream: &MediaStream,
        options: &EncoderOptions,
        events: EncoderEventSender,
    ) -> RecorderResult<Box<dyn MediaEncoder>> {
        if self.fail_on_create.load(Ordering::Acquire) {
            return Err(RecorderError::Encoder(
                "NotSupportedError: no encoder for stream".to_string(),
            ));
        }
        if stream.tracks().is_empty() {
            return Err(RecorderError::Encoder("stream has no tracks".to_string()));
        }

        let recording = Arc::new(AtomicBool::new(false));
        self.taps.lock().push(EncoderTap {
            events: events.clone(),
            recording: recording.clone(),
        });

        Ok(Box::new(SyntheticEncoder {
            mode: self.mode,
            mime_type: options
                .mime_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            events,
            recording,
            started: false,
            fail_on_stop: self.fail_on_stop.load(Ordering::Acquire),
            hold_stop: self.hold_stop.load(Ordering::Acquire),
            halt: None,
        }))
    }
}

struct SyntheticEncoder {
    mode: Mode,
    mime_type: String,
    events: EncoderEventSender,
    recording: Arc<AtomicBool>,
    started: bool,
    fail_on_stop: bool,
    hold_stop: bool,
    halt: Option<oneshot::Sender<()>>,
}

impl MediaEncoder for SyntheticEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, timeslice: Option<Duration>) -> RecorderResult<()> {
        if self.started {
            return Err(RecorderError::Encoder("InvalidStateError: already started".to_string()));
        }
        self.started = true;
        self.recording.store(true, Ordering::Release);

        if let Mode::Timesliced { chunk_size } = self.mode {
            let (halt_tx, halt_rx) = oneshot::channel();
            self.halt = Some(halt_tx);
            tokio::spawn(emit_slices(
                self.events.clone(),
                chunk_size,
                timeslice.unwrap_or(DEFAULT_TIMESLICE),
                halt_rx,
            ));
        }
        Ok(())
    }

    fn stop(&mut self) -> RecorderResult<()> {
        if self.fail_on_stop {
            return Err(RecorderError::Encoder("UnknownError: flush failed".to_string()));
        }
        if !self.recording.swap(false, Ordering::AcqRel) {
            return Err(RecorderError::Encoder("InvalidStateError: inactive".to_string()));
        }
        match self.halt.take() {
            // The slicing task emits the final chunk and the stop event
            Some(halt) => {
                let _ = halt.send(());
            }
            None if self.hold_stop => {}
            None => {
                let _ = self.events.send(EncoderEvent::Stopped);
            }
        }
        Ok(())
    }
}

async fn emit_slices(
    events: EncoderEventSender,
    chunk_size: usize,
    timeslice: Duration,
    mut halt: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(timeslice);
    // First tick completes immediately
    ticker.tick().await;
    let mut sequence: u8 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if events.send(EncoderEvent::DataAvailable(vec![sequence; chunk_size])).is_err() {
                    return;
                }
                sequence = sequence.wrapping_add(1);
            }
            _ = &mut halt => break,
        }
    }
    let _ = events.send(EncoderEvent::DataAvailable(vec![sequence; chunk_size]));
    let _ = events.send(EncoderEvent::Stopped);
}
