//! Frame data structures: planar input frames and packed RGBA buffers.

use crate::error::{invalid_frame, PipelineError};

/// One plane of a planar frame.
///
/// `row_stride` is the number of bytes between vertically adjacent samples,
/// `pixel_stride` the number of bytes between horizontally adjacent ones.
/// Neither is assumed to equal the plane width; capture sources routinely
/// pad rows and interleave chroma (pixel stride 2).
#[derive(Debug, Clone)]
pub struct Plane {
    /// Raw sample bytes
    pub data: Vec<u8>,
    /// Bytes per row
    pub row_stride: usize,
    /// Bytes between horizontally adjacent samples
    pub pixel_stride: usize,
}

impl Plane {
    /// Byte offset of the sample at plane coordinate (x, y).
    #[inline]
    pub fn sample_offset(&self, x: usize, y: usize) -> usize {
        y * self.row_stride + x * self.pixel_stride
    }

    /// Check that the buffer covers `cols` x `rows` samples through the strides.
    fn check_covers(&self, cols: usize, rows: usize, name: &str) -> Result<(), PipelineError> {
        if self.pixel_stride == 0 || self.row_stride == 0 {
            return Err(invalid_frame(format!("{} plane has zero stride", name)));
        }
        let last = self.sample_offset(cols - 1, rows - 1);
        if last >= self.data.len() {
            return Err(invalid_frame(format!(
                "{} plane too small: {} bytes, strides imply at least {}",
                name,
                self.data.len(),
                last + 1
            )));
        }
        Ok(())
    }
}

/// A planar YUV 4:2:0 frame as delivered by a frame source.
///
/// The luma plane covers `width x height` samples; the chroma planes cover
/// `ceil(width/2) x ceil(height/2)`. The frame is borrowed by the dispatcher
/// for the duration of one conversion and never retained past it.
#[derive(Debug, Clone)]
pub struct PlanarFrame {
    pub width: u32,
    pub height: u32,
    pub y: Plane,
    pub u: Plane,
    pub v: Plane,
}

impl PlanarFrame {
    /// Build a tightly packed frame (no row padding, pixel stride 1).
    ///
    /// Convenience for tests and synthetic sources; real sources typically
    /// deliver padded planes.
    pub fn tightly_packed(
        width: u32,
        height: u32,
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
    ) -> Self {
        let chroma_width = width.div_ceil(2) as usize;
        Self {
            width,
            height,
            y: Plane {
                data: y,
                row_stride: width as usize,
                pixel_stride: 1,
            },
            u: Plane {
                data: u,
                row_stride: chroma_width,
                pixel_stride: 1,
            },
            v: Plane {
                data: v,
                row_stride: chroma_width,
                pixel_stride: 1,
            },
        }
    }

    /// Chroma plane dimensions (subsampled by 2 in each direction).
    pub fn chroma_dimensions(&self) -> (usize, usize) {
        (
            self.width.div_ceil(2) as usize,
            self.height.div_ceil(2) as usize,
        )
    }

    /// Validate plane geometry against width/height and the strides.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid_frame(format!(
                "non-positive dimensions {}x{}",
                self.width, self.height
            )));
        }
        let (cw, ch) = self.chroma_dimensions();
        self.y
            .check_covers(self.width as usize, self.height as usize, "luma")?;
        self.u.check_covers(cw, ch, "chroma-U")?;
        self.v.check_covers(cw, ch, "chroma-V")?;
        Ok(())
    }
}

/// A packed RGBA frame: 4 bytes per pixel, tightly packed, row-major.
///
/// Capacity is exactly `width * height * 4`. Buffers are owned by the
/// frame-buffer pool (or the publish slot / render loop) and overwritten in
/// place frame after frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PackedBuffer {
    /// An empty 0x0 buffer, placeholder until the first real allocation.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Allocate a zeroed buffer of exactly `width * height * 4` bytes.
    ///
    /// Fails with `AllocationFailure` if the reservation cannot be made;
    /// the caller's capture cycle aborts and the next one retries.
    pub fn try_new(width: u32, height: u32) -> Result<Self, PipelineError> {
        let bytes = width as usize * height as usize * 4;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| PipelineError::AllocationFailure { bytes })?;
        data.resize(bytes, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height) pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of bytes, always `width * height * 4`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Stable identity of the underlying allocation, for reuse assertions.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Overwrite this buffer with the contents of `src`, adopting its
    /// dimensions. Reuses the existing allocation when sizes match.
    ///
    /// On a size change the replacement is built in a local vector and
    /// installed together with the new dimensions only once the reservation
    /// succeeded; a failed copy leaves the previous contents and dimensions
    /// fully intact.
    pub fn copy_from(&mut self, src: &PackedBuffer) -> Result<(), PipelineError> {
        if self.data.len() == src.data.len() {
            self.data.copy_from_slice(&src.data);
        } else {
            let mut data = Vec::new();
            data.try_reserve_exact(src.data.len())
                .map_err(|_| PipelineError::AllocationFailure {
                    bytes: src.data.len(),
                })?;
            data.extend_from_slice(&src.data);
            self.data = data;
        }
        self.width = src.width;
        self.height = src.height;
        Ok(())
    }
}
