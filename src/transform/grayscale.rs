//! Grayscale transform: BT.601 luma broadcast back to packed RGBA.

use crate::frame::PackedBuffer;

/// Replace every pixel with its rounded BT.601 luminance.
///
/// luma = round(0.299*R + 0.587*G + 0.114*B), computed in integer math with
/// coefficients scaled by 1000. Output is R=G=B=luma, A=255.
///
/// Dimensions are checked by the caller.
pub(super) fn apply(input: &PackedBuffer, output: &mut PackedBuffer) {
    let src = input.as_slice();
    let dst = output.as_mut_slice();
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let r = s[0] as u32;
        let g = s[1] as u32;
        let b = s[2] as u32;
        let luma = ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8;
        d[0] = luma;
        d[1] = luma;
        d[2] = luma;
        d[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgba: [u8; 4]) -> PackedBuffer {
        let mut buf = PackedBuffer::try_new(2, 2).unwrap();
        for px in buf.as_mut_slice().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        buf
    }

    #[test]
    fn test_pure_red_luma() {
        // round(0.299 * 255) = 76
        let input = solid([255, 0, 0, 255]);
        let mut output = PackedBuffer::try_new(2, 2).unwrap();
        apply(&input, &mut output);
        assert_eq!(&output.as_slice()[..4], &[76, 76, 76, 255]);
    }

    #[test]
    fn test_pure_green_luma() {
        // round(0.587 * 255) = 150 (149.685 rounds up via +500)
        let input = solid([0, 255, 0, 255]);
        let mut output = PackedBuffer::try_new(2, 2).unwrap();
        apply(&input, &mut output);
        assert_eq!(&output.as_slice()[..4], &[150, 150, 150, 255]);
    }

    #[test]
    fn test_white_stays_white() {
        let input = solid([255, 255, 255, 255]);
        let mut output = PackedBuffer::try_new(2, 2).unwrap();
        apply(&input, &mut output);
        assert_eq!(&output.as_slice()[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_alpha_ignored_on_input_forced_on_output() {
        let input = solid([60, 60, 60, 0]);
        let mut output = PackedBuffer::try_new(2, 2).unwrap();
        apply(&input, &mut output);
        assert_eq!(&output.as_slice()[..4], &[60, 60, 60, 255]);
    }
}
