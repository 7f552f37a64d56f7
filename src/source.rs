//! Synthetic frame source: a background thread producing strided YUV 4:2:0
//! test-pattern frames at a target rate.
//!
//! Stands in for the camera layer (which is out of scope) for the demo
//! binary and end-to-end tests. Planes carry padded rows and a chroma pixel
//! stride of 2 so the stride handling downstream is actually exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::dispatch::CaptureDispatcher;
use crate::frame::{Plane, PlanarFrame};

/// Row padding added to every generated plane.
const ROW_PAD: usize = 16;

/// Settings for the synthetic source.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub width: u32,
    pub height: u32,
    /// Delivery rate in frames per second
    pub fps: u32,
    /// Optional scripted resolution change: after `after_frames`
    /// deliveries, switch to the new dimensions
    pub switch: Option<ResolutionSwitch>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolutionSwitch {
    pub after_frames: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            switch: None,
        }
    }
}

/// Background producer delivering frames to a dispatcher callback.
pub struct TestPatternSource {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<u64>>,
}

impl TestPatternSource {
    /// Start delivering frames to `dispatcher.on_frame` from a background
    /// thread until stopped.
    pub fn start(settings: SourceSettings, dispatcher: Arc<CaptureDispatcher>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let interval = Duration::from_secs_f64(1.0 / settings.fps.max(1) as f64);
            let mut width = settings.width;
            let mut height = settings.height;
            let mut delivered: u64 = 0;

            while !thread_stop.load(Ordering::Relaxed) {
                if let Some(switch) = settings.switch {
                    if delivered == switch.after_frames {
                        width = switch.width;
                        height = switch.height;
                    }
                }

                let frame = test_pattern_frame(width, height, delivered);
                dispatcher.on_frame(&frame);
                delivered += 1;

                thread::sleep(interval);
            }
            delivered
        });

        Self {
            stop,
            thread: Some(handle),
        }
    }

    /// Stop the producer thread; returns the number of delivered frames.
    pub fn stop(&mut self) -> u64 {
        self.stop.store(true, Ordering::Relaxed);
        self.thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Generate one padded-stride test-pattern frame.
///
/// Luma is a diagonal gradient scrolling with `t`; chroma sweeps slowly so
/// every transform mode has something to chew on.
pub fn test_pattern_frame(width: u32, height: u32, t: u64) -> PlanarFrame {
    let w = width as usize;
    let h = height as usize;
    let (cw, ch) = (width.div_ceil(2) as usize, height.div_ceil(2) as usize);

    let y_stride = w + ROW_PAD;
    let mut y = vec![0u8; y_stride * h];
    for row in 0..h {
        for col in 0..w {
            y[row * y_stride + col] = ((col + row + t as usize) % 256) as u8;
        }
    }

    // Chroma planes interleaved-style: pixel stride 2, padded rows
    let c_stride = cw * 2 + ROW_PAD;
    let mut u = vec![0u8; c_stride * ch];
    let mut v = vec![0u8; c_stride * ch];
    for row in 0..ch {
        for col in 0..cw {
            u[row * c_stride + col * 2] = (128 + ((t / 4) % 64) as i32 - 32) as u8;
            v[row * c_stride + col * 2] = (128 - ((t / 4) % 64) as i32 + 32) as u8;
        }
    }

    PlanarFrame {
        width,
        height,
        y: Plane {
            data: y,
            row_stride: y_stride,
            pixel_stride: 1,
        },
        u: Plane {
            data: u,
            row_stride: c_stride,
            pixel_stride: 2,
        },
        v: Plane {
            data: v,
            row_stride: c_stride,
            pixel_stride: 2,
        },
    }
}
