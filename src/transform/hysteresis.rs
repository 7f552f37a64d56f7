//! Double-threshold edge detection with hysteresis.
//!
//! Pixels whose gradient magnitude reaches `high` are strong edges. Pixels
//! between `low` and `high` are weak and survive only when 8-connected
//! (directly or through other surviving weak pixels) to a strong edge.
//! Everything else is suppressed.

use super::sobel::l1_gradient;

/// Binary edge mask with double-threshold hysteresis.
///
/// Thresholds compare against the raw L1 Sobel magnitude. Raising either
/// threshold never increases the number of marked pixels: `high` bounds the
/// seed set, `low` bounds what a seed may recruit. The 1-pixel border is
/// always 0.
pub fn edge_mask(gray: &[u8], width: usize, height: usize, low: u32, high: u32) -> Vec<u8> {
    let mut mask = vec![0u8; width * height];
    if width < 3 || height < 3 {
        return mask;
    }

    let mag = l1_gradient(gray, width, height);

    // Strong seeds, interior only
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if mag[y * width + x] >= high {
                mask[y * width + x] = 255;
                stack.push((x, y));
            }
        }
    }

    // Promote 8-connected weak pixels, transitively
    while let Some((x, y)) = stack.pop() {
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 1 || ny < 1 || nx >= width as i32 - 1 || ny >= height as i32 - 1 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let idx = ny * width + nx;
                if mask[idx] == 0 && mag[idx] >= low {
                    mask[idx] = 255;
                    stack.push((nx, ny));
                }
            }
        }
    }

    mask
}
