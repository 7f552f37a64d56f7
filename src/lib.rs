//! edgeviewer library crate.
//!
//! Live-video visualization pipeline: planar YUV 4:2:0 frames come in on a
//! capture callback, get converted to RGBA, run through a pluggable
//! transform, and land in a single-slot publish buffer that a fixed-cadence
//! render loop drains. An optional relay side channel pushes JPEG snapshots
//! of the rendered stream to a remote observer.

pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod fps;
pub mod frame;
pub mod pool;
pub mod publish;
pub mod relay;
pub mod render;
pub mod source;
pub mod transform;
