//! Fixed-cadence render loop: pulls the latest published frame and drives
//! it into the display sink, independently of capture arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::PipelineError;
use crate::fps::FpsMeter;
use crate::frame::PackedBuffer;
use crate::publish::FrameSlot;
use crate::relay::RelayForwarder;

/// Default tick interval, ~60 Hz.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Where rendered frames go. The sink owns its own presentation timing; the
/// loop does not assume it returns quickly.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: &PackedBuffer) -> Result<(), PipelineError>;
}

/// Counters shared with the caller while the loop runs.
#[derive(Debug, Default)]
pub struct RenderStats {
    ticks: AtomicU64,
    frames_presented: AtomicU64,
    sink_errors: AtomicU64,
}

impl RenderStats {
    /// Ticks that had a frame available to present.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Relaxed)
    }

    /// Display-sink failures; the loop logs them and keeps going.
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }
}

/// Fixed-cadence consumer of the publish slot.
///
/// The tick schedule is a soft target: an overrunning sink call delays the
/// next tick to one interval after completion (`MissedTickBehavior::Delay`),
/// never a catch-up burst. No error escapes a tick; cancellation stops the
/// schedule at the next boundary.
pub struct RenderLoop {
    slot: Arc<FrameSlot>,
    sink: Box<dyn DisplaySink>,
    interval: Duration,
    fps: FpsMeter,
    relay: Option<RelayForwarder>,
    stats: Arc<RenderStats>,
}

impl RenderLoop {
    pub fn new(slot: Arc<FrameSlot>, sink: Box<dyn DisplaySink>) -> Self {
        Self {
            slot,
            sink,
            interval: DEFAULT_TICK_INTERVAL,
            fps: FpsMeter::new(),
            relay: None,
            stats: Arc::new(RenderStats::default()),
        }
    }

    /// Override the tick interval (default 16 ms).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Attach a relay forwarder sampling the rendered frames.
    pub fn with_relay(mut self, relay: RelayForwarder) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Shared handle to the loop's counters.
    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    /// Run until `cancel` turns true (or its sender is dropped).
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        if *cancel.borrow() {
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Reader-owned copy of the newest frame; reused across ticks
        let mut current = PackedBuffer::empty();
        let mut last_seq = 0u64;
        let mut last_fps = 0.0f64;

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Some(seq) = self.slot.latest_into(&mut current, last_seq) {
                        last_seq = seq;
                    }
                    if last_seq == 0 {
                        // Nothing published yet
                        continue;
                    }
                    self.stats.ticks.fetch_add(1, Ordering::Relaxed);

                    match self.sink.present(&current) {
                        Ok(()) => {
                            self.stats.frames_presented.fetch_add(1, Ordering::Relaxed);
                            if let Some(relay) = self.relay.as_mut() {
                                relay.offer(&current);
                            }
                        }
                        Err(e) => {
                            self.stats.sink_errors.fetch_add(1, Ordering::Relaxed);
                            log::error!("display sink failed: {}", e);
                        }
                    }

                    let fps = self.fps.tick();
                    if fps > 0.0 && fps != last_fps {
                        log::info!("render fps: {:.1}", fps);
                        last_fps = fps;
                    }
                }
            }
        }

        log::debug!(
            "render loop stopped after {} ticks, {} presented, {} sink errors",
            self.stats.ticks(),
            self.stats.frames_presented(),
            self.stats.sink_errors()
        );
    }
}
