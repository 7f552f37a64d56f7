//! Frame-buffer pool: owns the intermediate packed buffers of one capture
//! pipeline and reuses them across frames.

use crate::error::PipelineError;
use crate::frame::PackedBuffer;

/// Owns the conversion target and the transform target for one dispatcher.
///
/// `acquire` is not safe for concurrent callers; the dispatcher serializes
/// it with the capture cycle. On a dimension change both buffers are
/// replaced whole (a partially reallocated buffer is never observable), on
/// a match they are handed out unchanged for in-place overwrite.
#[derive(Debug)]
pub struct FrameBufferPool {
    converted: PackedBuffer,
    transformed: PackedBuffer,
    reallocations: u64,
}

impl FrameBufferPool {
    pub fn new() -> Self {
        Self {
            converted: PackedBuffer::empty(),
            transformed: PackedBuffer::empty(),
            reallocations: 0,
        }
    }

    /// Ensure both buffers have exactly `width * height * 4` capacity.
    ///
    /// Returns `true` when this call reallocated (dimensions changed),
    /// `false` when the existing buffers were reused. On `AllocationFailure`
    /// the previous buffers stay intact so the next cycle can retry.
    pub fn acquire(&mut self, width: u32, height: u32) -> Result<bool, PipelineError> {
        if self.converted.dimensions() == (width, height)
            && self.transformed.dimensions() == (width, height)
        {
            return Ok(false);
        }

        // Allocate both before installing either; resize is all-or-nothing.
        let converted = PackedBuffer::try_new(width, height)?;
        let transformed = PackedBuffer::try_new(width, height)?;
        self.converted = converted;
        self.transformed = transformed;
        self.reallocations += 1;
        Ok(true)
    }

    /// Mutable access to both buffers at once: (conversion target,
    /// transform target).
    pub fn split_mut(&mut self) -> (&mut PackedBuffer, &mut PackedBuffer) {
        (&mut self.converted, &mut self.transformed)
    }

    /// Current buffer dimensions, (0, 0) before the first acquire.
    pub fn dimensions(&self) -> (u32, u32) {
        self.converted.dimensions()
    }

    /// How many times the pool replaced its buffers.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}

impl Default for FrameBufferPool {
    fn default() -> Self {
        Self::new()
    }
}
