//! Capture dispatcher: the callback side of the pipeline.
//!
//! The frame source invokes `on_frame` on whatever thread it owns. Each
//! accepted frame runs convert -> transform -> publish with at most one
//! frame in flight per dispatcher; a frame arriving while the previous one
//! is still processing is dropped, never queued (latency is traded for
//! freshness).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::convert::yuv420_to_rgba;
use crate::error::PipelineError;
use crate::frame::PlanarFrame;
use crate::pool::FrameBufferPool;
use crate::publish::FrameSlot;
use crate::transform::TransformConfig;

/// Counters kept by the dispatcher; all monotonically increasing.
#[derive(Debug, Default)]
pub struct DispatchStats {
    processed: AtomicU64,
    dropped_busy: AtomicU64,
    dropped_error: AtomicU64,
}

impl DispatchStats {
    /// Frames that completed convert + transform + publish.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Frames dropped because the previous frame was still in flight.
    pub fn dropped_busy(&self) -> u64 {
        self.dropped_busy.load(Ordering::Relaxed)
    }

    /// Frames dropped because conversion or transform failed.
    pub fn dropped_error(&self) -> u64 {
        self.dropped_error.load(Ordering::Relaxed)
    }
}

/// Receives raw planar frames and drives them through the pipeline.
pub struct CaptureDispatcher {
    /// Pool behind the cycle lock; `try_lock` failure is the backpressure drop
    cycle: Mutex<FrameBufferPool>,
    slot: Arc<FrameSlot>,
    config: Arc<Mutex<TransformConfig>>,
    accepting: AtomicBool,
    stats: DispatchStats,
}

impl CaptureDispatcher {
    /// Build a dispatcher publishing into `slot` and reading the active
    /// transform from `config` once per cycle.
    pub fn new(slot: Arc<FrameSlot>, config: Arc<Mutex<TransformConfig>>) -> Self {
        Self {
            cycle: Mutex::new(FrameBufferPool::new()),
            slot,
            config,
            accepting: AtomicBool::new(true),
            stats: DispatchStats::default(),
        }
    }

    /// Frame-source callback. Never blocks on a busy pipeline and never
    /// propagates an error back to the source.
    ///
    /// Returns the published sequence number, or `None` when the frame was
    /// dropped (pipeline busy, dispatcher closed, or a per-frame failure).
    pub fn on_frame(&self, frame: &PlanarFrame) -> Option<u64> {
        if !self.accepting.load(Ordering::Acquire) {
            return None;
        }

        // At most one frame in flight: a contended lock means the previous
        // frame is still converting/transforming, so this one is dropped.
        let Ok(mut pool) = self.cycle.try_lock() else {
            self.stats.dropped_busy.fetch_add(1, Ordering::Relaxed);
            log::debug!("frame dropped, pipeline busy");
            return None;
        };

        // Snapshot the active transform once per cycle; a concurrent mode
        // toggle takes effect on the next frame.
        let config = match self.config.lock() {
            Ok(guard) => *guard,
            Err(_) => {
                self.stats.dropped_error.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match Self::process(&mut pool, &config, frame, &self.slot) {
            Ok(seq) => {
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
                Some(seq)
            }
            Err(e) => {
                self.stats.dropped_error.fetch_add(1, Ordering::Relaxed);
                log::warn!("frame dropped: {}", e);
                None
            }
        }
    }

    fn process(
        pool: &mut FrameBufferPool,
        config: &TransformConfig,
        frame: &PlanarFrame,
        slot: &FrameSlot,
    ) -> Result<u64, PipelineError> {
        // Plane geometry is validated by the converter
        if pool.acquire(frame.width, frame.height)? {
            log::info!(
                "frame buffers resized to {}x{}",
                frame.width,
                frame.height
            );
        }

        let (converted, transformed) = pool.split_mut();
        yuv420_to_rgba(frame, converted)?;
        config.apply(converted, transformed)?;
        slot.publish(transformed)
    }

    /// Stop accepting frames and let any in-flight frame drain.
    ///
    /// After `close` returns, no further frame will be published.
    pub fn close(&self) {
        self.accepting.store(false, Ordering::Release);
        // Wait for an in-flight cycle to finish before teardown
        drop(self.cycle.lock());
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Number of times the pool replaced its buffers (resize events).
    pub fn pool_reallocations(&self) -> u64 {
        self.cycle
            .lock()
            .map(|pool| pool.reallocations())
            .unwrap_or(0)
    }
}
