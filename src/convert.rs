//! Planar YUV 4:2:0 to packed RGBA color conversion.
//!
//! This is the per-frame hot path: fixed-point integer math only, strides
//! honored exactly, no allocation inside the pixel loop.

use crate::error::PipelineError;
use crate::frame::{PackedBuffer, PlanarFrame};

/// Convert a planar YUV 4:2:0 frame into a packed RGBA buffer.
///
/// The conversion uses BT.601 limited-range coefficients scaled by 1024:
///
/// ```text
/// yf = max(0, Y - 16)
/// r  = (1192*yf + 1634*(V-128)) >> 10
/// g  = (1192*yf -  833*(V-128) - 400*(U-128)) >> 10
/// b  = (1192*yf + 2066*(U-128)) >> 10
/// ```
///
/// each channel clamped to 0..=255, alpha forced to 255. The chroma sample
/// for pixel (x, y) is read at chroma coordinate (x>>1, y>>1) through that
/// plane's own row and pixel strides.
///
/// # Errors
/// * `InvalidFrame` - a plane buffer is smaller than its strides imply
/// * `DimensionMismatch` - `out` capacity is not `width * height * 4`
pub fn yuv420_to_rgba(frame: &PlanarFrame, out: &mut PackedBuffer) -> Result<(), PipelineError> {
    frame.validate()?;
    if out.dimensions() != (frame.width, frame.height) {
        return Err(PipelineError::dimension_mismatch(
            (frame.width, frame.height),
            out.dimensions(),
        ));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let rgba = out.as_mut_slice();

    let mut dst = 0;
    for row in 0..height {
        let y_row = row * frame.y.row_stride;
        let u_row = (row >> 1) * frame.u.row_stride;
        let v_row = (row >> 1) * frame.v.row_stride;
        for col in 0..width {
            let y = frame.y.data[y_row + col * frame.y.pixel_stride] as i32;
            let u = frame.u.data[u_row + (col >> 1) * frame.u.pixel_stride] as i32;
            let v = frame.v.data[v_row + (col >> 1) * frame.v.pixel_stride] as i32;

            let yf = (y - 16).max(0);
            let uf = u - 128;
            let vf = v - 128;

            let r = (1192 * yf + 1634 * vf) >> 10;
            let g = (1192 * yf - 833 * vf - 400 * uf) >> 10;
            let b = (1192 * yf + 2066 * uf) >> 10;

            rgba[dst] = r.clamp(0, 255) as u8;
            rgba[dst + 1] = g.clamp(0, 255) as u8;
            rgba[dst + 2] = b.clamp(0, 255) as u8;
            rgba[dst + 3] = 255;
            dst += 4;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Plane;

    fn uniform_frame(width: u32, height: u32, y: u8, u: u8, v: u8) -> PlanarFrame {
        let (cw, ch) = (width.div_ceil(2) as usize, height.div_ceil(2) as usize);
        PlanarFrame::tightly_packed(
            width,
            height,
            vec![y; (width * height) as usize],
            vec![u; cw * ch],
            vec![v; cw * ch],
        )
    }

    #[test]
    fn test_mid_gray_frame_is_uniform() {
        // y=128 -> yf=112 -> (1192*112)>>10 = 130 on all three channels
        let frame = uniform_frame(4, 4, 128, 128, 128);
        let mut out = PackedBuffer::try_new(4, 4).unwrap();
        yuv420_to_rgba(&frame, &mut out).unwrap();
        for px in out.as_slice().chunks_exact(4) {
            assert_eq!(px, &[130, 130, 130, 255]);
        }
    }

    #[test]
    fn test_black_frame_clamps_to_zero() {
        let frame = uniform_frame(4, 4, 0, 128, 128);
        let mut out = PackedBuffer::try_new(4, 4).unwrap();
        yuv420_to_rgba(&frame, &mut out).unwrap();
        for px in out.as_slice().chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_white_frame_clamps_to_255() {
        let frame = uniform_frame(4, 4, 255, 128, 128);
        let mut out = PackedBuffer::try_new(4, 4).unwrap();
        yuv420_to_rgba(&frame, &mut out).unwrap();
        for px in out.as_slice().chunks_exact(4) {
            assert_eq!(px, &[255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_alpha_is_always_opaque() {
        let frame = uniform_frame(6, 4, 90, 200, 40);
        let mut out = PackedBuffer::try_new(6, 4).unwrap();
        yuv420_to_rgba(&frame, &mut out).unwrap();
        for px in out.as_slice().chunks_exact(4) {
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let frame = uniform_frame(8, 8, 73, 110, 160);
        let mut first = PackedBuffer::try_new(8, 8).unwrap();
        let mut second = PackedBuffer::try_new(8, 8).unwrap();
        yuv420_to_rgba(&frame, &mut first).unwrap();
        yuv420_to_rgba(&frame, &mut second).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn test_padded_strides_match_tight_layout() {
        // Same samples once tightly packed and once with padded rows and
        // interleaved (pixel stride 2) chroma; outputs must be identical.
        let width = 4u32;
        let height = 4u32;
        let y_samples: Vec<u8> = (0..16).map(|i| (40 + i * 10) as u8).collect();
        let u_samples = [100u8, 120, 140, 160];
        let v_samples = [90u8, 110, 130, 150];

        let tight = PlanarFrame::tightly_packed(
            width,
            height,
            y_samples.clone(),
            u_samples.to_vec(),
            v_samples.to_vec(),
        );

        // Luma rows padded to 7 bytes, chroma interleaved every other byte
        let mut y_padded = vec![0u8; 7 * 4];
        for row in 0..4 {
            for col in 0..4 {
                y_padded[row * 7 + col] = y_samples[row * 4 + col];
            }
        }
        let mut u_padded = vec![0u8; 2 * 4];
        let mut v_padded = vec![0u8; 2 * 4];
        for row in 0..2 {
            for col in 0..2 {
                u_padded[row * 4 + col * 2] = u_samples[row * 2 + col];
                v_padded[row * 4 + col * 2] = v_samples[row * 2 + col];
            }
        }
        let padded = PlanarFrame {
            width,
            height,
            y: Plane {
                data: y_padded,
                row_stride: 7,
                pixel_stride: 1,
            },
            u: Plane {
                data: u_padded,
                row_stride: 4,
                pixel_stride: 2,
            },
            v: Plane {
                data: v_padded,
                row_stride: 4,
                pixel_stride: 2,
            },
        };

        let mut tight_out = PackedBuffer::try_new(width, height).unwrap();
        let mut padded_out = PackedBuffer::try_new(width, height).unwrap();
        yuv420_to_rgba(&tight, &mut tight_out).unwrap();
        yuv420_to_rgba(&padded, &mut padded_out).unwrap();
        assert_eq!(tight_out.as_slice(), padded_out.as_slice());
    }

    #[test]
    fn test_wrong_output_capacity_is_dimension_mismatch() {
        let frame = uniform_frame(4, 4, 128, 128, 128);
        let mut out = PackedBuffer::try_new(4, 2).unwrap();
        let err = yuv420_to_rgba(&frame, &mut out).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_short_plane_is_invalid_frame() {
        let frame = PlanarFrame::tightly_packed(4, 4, vec![0; 15], vec![0; 4], vec![0; 4]);
        let mut out = PackedBuffer::try_new(4, 4).unwrap();
        let err = yuv420_to_rgba(&frame, &mut out).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFrame { .. }));
    }
}
