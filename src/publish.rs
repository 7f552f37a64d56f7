//! Single-slot frame exchange between the capture and render contexts.

use std::sync::Mutex;

use crate::error::PipelineError;
use crate::frame::PackedBuffer;

/// The most recently published frame plus its sequence number.
#[derive(Debug)]
struct SlotInner {
    buffer: PackedBuffer,
    seq: u64,
}

/// Latest-frame slot: capture context is the sole writer, render context the
/// sole reader.
///
/// The lock is held only for the byte copy in and out, never for a
/// conversion or transform, so the reader always observes either the
/// previous complete frame or the new complete frame. Sequence numbers
/// strictly increase; 0 means nothing has been published yet.
#[derive(Debug)]
pub struct FrameSlot {
    inner: Mutex<SlotInner>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                buffer: PackedBuffer::empty(),
                seq: 0,
            }),
        }
    }

    /// Publish a finished frame, returning its sequence number.
    ///
    /// The slot buffer is overwritten in place (reallocating only when the
    /// dimensions changed); `frame` stays with the caller's pool for reuse.
    pub fn publish(&self, frame: &PackedBuffer) -> Result<u64, PipelineError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PipelineError::SinkFailure("publish slot poisoned".into()))?;
        inner.buffer.copy_from(frame)?;
        inner.seq += 1;
        Ok(inner.seq)
    }

    /// Copy the latest frame into `dst` if it is newer than `last_seen`.
    ///
    /// Returns the new sequence number on a copy, `None` when the slot holds
    /// nothing newer (rendering the previous copy again is fine).
    pub fn latest_into(&self, dst: &mut PackedBuffer, last_seen: u64) -> Option<u64> {
        let inner = self.inner.lock().ok()?;
        if inner.seq == 0 || inner.seq <= last_seen {
            return None;
        }
        dst.copy_from(&inner.buffer).ok()?;
        Some(inner.seq)
    }

    /// Sequence number of the latest published frame (0 before the first).
    pub fn latest_seq(&self) -> u64 {
        self.inner.lock().map(|inner| inner.seq).unwrap_or(0)
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, value: u8) -> PackedBuffer {
        let mut buf = PackedBuffer::try_new(width, height).unwrap();
        buf.as_mut_slice().fill(value);
        buf
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let slot = FrameSlot::new();
        let mut dst = PackedBuffer::empty();
        assert_eq!(slot.latest_into(&mut dst, 0), None);
        assert_eq!(slot.latest_seq(), 0);
    }

    #[test]
    fn test_publish_then_read() {
        let slot = FrameSlot::new();
        let frame = filled(4, 4, 42);
        assert_eq!(slot.publish(&frame).unwrap(), 1);

        let mut dst = PackedBuffer::empty();
        let seq = slot.latest_into(&mut dst, 0).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(dst.dimensions(), (4, 4));
        assert!(dst.as_slice().iter().all(|&b| b == 42));
    }

    #[test]
    fn test_already_seen_frame_is_not_recopied() {
        let slot = FrameSlot::new();
        slot.publish(&filled(4, 4, 1)).unwrap();

        let mut dst = PackedBuffer::empty();
        let seq = slot.latest_into(&mut dst, 0).unwrap();
        assert_eq!(slot.latest_into(&mut dst, seq), None);
    }

    #[test]
    fn test_sequence_numbers_strictly_increase() {
        let slot = FrameSlot::new();
        let frame = filled(2, 2, 0);
        let a = slot.publish(&frame).unwrap();
        let b = slot.publish(&frame).unwrap();
        let c = slot.publish(&frame).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_reader_sees_newest_after_skipped_frames() {
        let slot = FrameSlot::new();
        slot.publish(&filled(2, 2, 10)).unwrap();
        slot.publish(&filled(2, 2, 20)).unwrap();
        slot.publish(&filled(2, 2, 30)).unwrap();

        let mut dst = PackedBuffer::empty();
        let seq = slot.latest_into(&mut dst, 1).unwrap();
        assert_eq!(seq, 3);
        assert!(dst.as_slice().iter().all(|&b| b == 30));
    }

    #[test]
    fn test_publish_adopts_new_dimensions() {
        let slot = FrameSlot::new();
        slot.publish(&filled(640, 480, 0)).unwrap();
        slot.publish(&filled(1280, 720, 0)).unwrap();

        let mut dst = PackedBuffer::empty();
        slot.latest_into(&mut dst, 0).unwrap();
        assert_eq!(dst.dimensions(), (1280, 720));
        assert_eq!(dst.len(), 1280 * 720 * 4);
    }
}
