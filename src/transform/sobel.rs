//! Sobel edge detection over a single-channel luma plane.

/// L1 gradient magnitude via the 3x3 Sobel kernels.
///
/// ```text
/// Gx:          Gy:
/// [-1  0  1]   [ 1  2  1]
/// [-2  0  2]   [ 0  0  0]
/// [-1  0  1]   [-1 -2 -1]
/// ```
///
/// magnitude = |gx| + |gy| (cheaper than the Euclidean norm and visually
/// equivalent for thresholded masks). The 1-pixel border, where the kernel
/// does not fit, is left at 0.
pub(super) fn l1_gradient(gray: &[u8], width: usize, height: usize) -> Vec<u32> {
    let mut mag = vec![0u32; width * height];
    if width < 3 || height < 3 {
        return mag;
    }

    let sobel_x: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
    let sobel_y: [[i32; 3]; 3] = [[1, 2, 1], [0, 0, 0], [-1, -2, -1]];

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx: i32 = 0;
            let mut gy: i32 = 0;
            for (ky, (row_x, row_y)) in sobel_x.iter().zip(&sobel_y).enumerate() {
                let base = (y + ky - 1) * width + x - 1;
                for kx in 0..3 {
                    let val = gray[base + kx] as i32;
                    gx += val * row_x[kx];
                    gy += val * row_y[kx];
                }
            }
            mag[y * width + x] = (gx.abs() + gy.abs()) as u32;
        }
    }

    mag
}

/// Single-threshold binary edge mask.
///
/// A pixel is marked (255) when `(magnitude >> 3) >= threshold`, so a higher
/// threshold never marks more pixels than a lower one. The border is always
/// 0.
pub fn edge_mask(gray: &[u8], width: usize, height: usize, threshold: u32) -> Vec<u8> {
    let mag = l1_gradient(gray, width, height);
    let mut mask = vec![0u8; width * height];
    if width < 3 || height < 3 {
        return mask;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            if (mag[idx] >> 3) >= threshold {
                mask[idx] = 255;
            }
        }
    }

    mask
}
