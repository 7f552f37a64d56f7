//! Best-effort relay side channel: every Nth rendered frame is JPEG-encoded
//! and pushed to a remote observer.
//!
//! The push runs on a detached task behind a latest-wins slot; nothing on
//! this path may block or fail the render loop, so every error is swallowed
//! (debug-logged) after a short timeout.

use std::io::Cursor;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tokio::sync::watch;

use crate::error::PipelineError;
use crate::frame::PackedBuffer;

/// Forward every 60th frame by default (~1 snapshot/second at 60 Hz).
pub const DEFAULT_FORWARD_EVERY: u64 = 60;

/// JPEG quality for relay snapshots.
pub const DEFAULT_JPEG_QUALITY: u8 = 60;

/// Connect and request timeout for the push.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_millis(1500);

/// Samples the rendered frame stream and pushes JPEG snapshots.
///
/// Must be created inside a tokio runtime (it spawns the push task).
/// Dropping the forwarder closes the slot and lets the task drain.
pub struct RelayForwarder {
    every: u64,
    quality: u8,
    counter: u64,
    tx: watch::Sender<Option<Vec<u8>>>,
}

impl RelayForwarder {
    /// Forwarder with default cadence, quality, and timeout.
    pub fn new(url: String) -> Result<Self, PipelineError> {
        Self::with_cadence(url, DEFAULT_FORWARD_EVERY, DEFAULT_JPEG_QUALITY)
    }

    /// Forwarder pushing every `every`th frame at the given JPEG quality.
    pub fn with_cadence(url: String, every: u64, quality: u8) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_PUSH_TIMEOUT)
            .connect_timeout(DEFAULT_PUSH_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::SinkFailure(e.to_string()))?;

        let (tx, mut rx) = watch::channel::<Option<Vec<u8>>>(None);

        // Detached push task: lives until the forwarder is dropped
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let payload = rx.borrow_and_update().clone();
                let Some(jpeg) = payload else { continue };
                let result = client
                    .post(&url)
                    .header("Content-Type", "image/jpeg")
                    .body(jpeg)
                    .send()
                    .await;
                match result {
                    Ok(response) => {
                        log::debug!("relay push status {}", response.status());
                    }
                    Err(e) => {
                        // Best effort: timeouts and refusals are expected
                        log::debug!("relay push failed: {}", e);
                    }
                }
            }
        });

        Ok(Self {
            every: every.max(1),
            quality,
            counter: 0,
            tx,
        })
    }

    /// Offer a rendered frame; every `every`th one is encoded and queued.
    ///
    /// The queue holds one snapshot, latest wins. Encode failures are
    /// swallowed like push failures.
    pub fn offer(&mut self, frame: &PackedBuffer) {
        self.counter += 1;
        if self.counter % self.every != 0 {
            return;
        }
        match encode_jpeg(frame, self.quality) {
            Ok(jpeg) => {
                let _ = self.tx.send(Some(jpeg));
            }
            Err(e) => {
                log::debug!("relay snapshot encode failed: {}", e);
            }
        }
    }

    /// Frames offered so far.
    pub fn offered(&self) -> u64 {
        self.counter
    }
}

/// Encode a packed RGBA frame as JPEG (alpha stripped).
pub fn encode_jpeg(frame: &PackedBuffer, quality: u8) -> Result<Vec<u8>, PipelineError> {
    if frame.is_empty() {
        return Err(PipelineError::SinkFailure("empty frame".into()));
    }

    let mut rgb = Vec::with_capacity(frame.len() / 4 * 3);
    for px in frame.as_slice().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(&rgb, frame.width(), frame.height(), ExtendedColorType::Rgb8)
        .map_err(|e| PipelineError::SinkFailure(e.to_string()))?;
    Ok(out.into_inner())
}
