//! Per-frame visual transforms over packed RGBA buffers.
//!
//! Every variant maps an input `PackedBuffer` to an output buffer of
//! identical dimensions:
//!
//! 1. **Identity** - unchanged copy
//! 2. **Grayscale** - BT.601 luma broadcast to R, G, B
//! 3. **Sobel** - single-threshold gradient-magnitude edge mask
//! 4. **Hysteresis** - double-threshold edge mask with 8-connected
//!    weak-pixel promotion
//!
//! Edge masks are binary (0 or 255) broadcast to the color channels with
//! alpha forced opaque. Scratch planes are allocated up front, never inside
//! the per-pixel loops.

mod grayscale;
mod hysteresis;
mod sobel;

pub use sobel::edge_mask as sobel_edge_mask;
pub use hysteresis::edge_mask as hysteresis_edge_mask;

use crate::error::PipelineError;
use crate::frame::PackedBuffer;

/// Default Sobel threshold, compared against `magnitude >> 3`.
pub const DEFAULT_SOBEL_THRESHOLD: u32 = 40;

/// Default hysteresis thresholds, compared against the raw L1 magnitude.
pub const DEFAULT_HYSTERESIS_LOW: u32 = 50;
pub const DEFAULT_HYSTERESIS_HIGH: u32 = 150;

/// The active per-frame transform plus its parameters.
///
/// Immutable per invocation; the capture dispatcher reads the active config
/// once at the start of each cycle, so a swap takes effect on the next
/// frame, never mid-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformConfig {
    /// Pass the converted frame through unchanged
    Identity,
    /// Luma-only rendition
    Grayscale,
    /// Binary edge mask from the L1 Sobel gradient magnitude
    Sobel { threshold: u32 },
    /// Double-threshold edge mask with hysteresis promotion
    Hysteresis { low: u32, high: u32 },
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::Sobel {
            threshold: DEFAULT_SOBEL_THRESHOLD,
        }
    }
}

impl TransformConfig {
    /// Parse a mode name from string, using default parameters.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "identity" | "none" => Some(Self::Identity),
            "grayscale" | "gray" => Some(Self::Grayscale),
            "sobel" | "edges" => Some(Self::Sobel {
                threshold: DEFAULT_SOBEL_THRESHOLD,
            }),
            "hysteresis" | "canny" => Some(Self::Hysteresis {
                low: DEFAULT_HYSTERESIS_LOW,
                high: DEFAULT_HYSTERESIS_HIGH,
            }),
            _ => None,
        }
    }

    /// Apply this transform, writing into `output`.
    ///
    /// # Errors
    /// `DimensionMismatch` if input and output dimensions disagree.
    pub fn apply(
        &self,
        input: &PackedBuffer,
        output: &mut PackedBuffer,
    ) -> Result<(), PipelineError> {
        if input.dimensions() != output.dimensions() {
            return Err(PipelineError::dimension_mismatch(
                input.dimensions(),
                output.dimensions(),
            ));
        }

        match *self {
            Self::Identity => {
                output.as_mut_slice().copy_from_slice(input.as_slice());
            }
            Self::Grayscale => grayscale::apply(input, output),
            Self::Sobel { threshold } => {
                let luma = luma_plane(input);
                let mask = sobel::edge_mask(
                    &luma,
                    input.width() as usize,
                    input.height() as usize,
                    threshold,
                );
                broadcast_mask(&mask, output);
            }
            Self::Hysteresis { low, high } => {
                let luma = luma_plane(input);
                let mask = hysteresis::edge_mask(
                    &luma,
                    input.width() as usize,
                    input.height() as usize,
                    low,
                    high,
                );
                broadcast_mask(&mask, output);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TransformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Grayscale => write!(f, "grayscale"),
            Self::Sobel { threshold } => write!(f, "sobel({})", threshold),
            Self::Hysteresis { low, high } => write!(f, "hysteresis({}, {})", low, high),
        }
    }
}

/// Reduce packed RGBA to a single-channel luma plane.
///
/// Integer-truncated BT.601 (the edge detectors want the same plane the
/// original gradient kernels saw); the grayscale transform uses its own
/// rounded variant.
pub(crate) fn luma_plane(input: &PackedBuffer) -> Vec<u8> {
    let mut luma = Vec::with_capacity(input.len() / 4);
    for px in input.as_slice().chunks_exact(4) {
        let r = px[0] as u32;
        let g = px[1] as u32;
        let b = px[2] as u32;
        luma.push(((299 * r + 587 * g + 114 * b) / 1000) as u8);
    }
    luma
}

/// Broadcast a single-channel mask to R, G, B with opaque alpha.
fn broadcast_mask(mask: &[u8], output: &mut PackedBuffer) {
    for (px, &m) in output.as_mut_slice().chunks_exact_mut(4).zip(mask) {
        px[0] = m;
        px[1] = m;
        px[2] = m;
        px[3] = 255;
    }
}
