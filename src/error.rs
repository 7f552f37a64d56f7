//! Error types for the frame processing pipeline.

/// Errors that can occur inside the frame processing pipeline.
///
/// Policy: `InvalidFrame` and `DimensionMismatch` drop the affected frame
/// and the pipeline keeps running. `AllocationFailure` aborts the capture
/// cycle that triggered it; the next cycle retries. `SinkFailure` on the
/// display sink is reported by the render loop, `SinkFailure` on the relay
/// sink is always swallowed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid frame: {reason}")]
    InvalidFrame {
        /// What was wrong with the plane geometry
        reason: String,
    },

    #[error("dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("allocation failure: could not reserve {bytes} bytes")]
    AllocationFailure {
        /// Size of the buffer that could not be allocated
        bytes: usize,
    },

    #[error("sink failure: {0}")]
    SinkFailure(String),
}

impl PipelineError {
    /// Build a `DimensionMismatch` from two (width, height) pairs.
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        PipelineError::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }

    fn invalid_frame(reason: impl Into<String>) -> Self {
        PipelineError::InvalidFrame {
            reason: reason.into(),
        }
    }
}

/// Shorthand used by frame validation.
pub(crate) fn invalid_frame(reason: impl Into<String>) -> PipelineError {
    PipelineError::invalid_frame(reason)
}
