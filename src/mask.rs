// src/mask.rs
//
// Lane-pixel segmentation on the rectified frame. Pixels are classified in
// HLS space against two inclusive ranges (white paint, yellow paint); the
// mask is their union.

use crate::types::SegmentationConfig;
use ndarray::Array2;

/// Convert RGB to HLS in the 8-bit convention: H in 0..=180 (degrees / 2),
/// L and S in 0..=255.
#[inline]
pub fn rgb_to_hls(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r_n = r as f32 / 255.0;
    let g_n = g as f32 / 255.0;
    let b_n = b as f32 / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;
    let sum = max + min;

    let l = sum / 2.0;

    let (h, s) = if delta < 1e-6 {
        (0.0, 0.0)
    } else {
        let s = if l < 0.5 {
            delta / sum
        } else {
            delta / (2.0 - sum)
        };

        let h = if (max - r_n).abs() < 1e-6 {
            60.0 * (g_n - b_n) / delta
        } else if (max - g_n).abs() < 1e-6 {
            120.0 + 60.0 * (b_n - r_n) / delta
        } else {
            240.0 + 60.0 * (r_n - g_n) / delta
        };
        let h = if h < 0.0 { h + 360.0 } else { h };

        (h, s)
    };

    (
        (h / 2.0).round().clamp(0.0, 180.0) as u8,
        (l * 255.0).round().clamp(0.0, 255.0) as u8,
        (s * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

#[inline]
fn in_range(hls: (u8, u8, u8), low: [u8; 3], high: [u8; 3]) -> bool {
    let (h, l, s) = hls;
    h >= low[0] && h <= high[0] && l >= low[1] && l <= high[1] && s >= low[2] && s <= high[2]
}

/// Build the binary lane mask (0/1) for a rectified RGB frame. The array is
/// indexed `[row, column]`, matching the frame's row-major layout.
pub fn lane_mask(
    rgb: &[u8],
    width: usize,
    height: usize,
    config: &SegmentationConfig,
) -> Array2<u8> {
    let mut mask = Array2::<u8>::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 3;
            let hls = rgb_to_hls(rgb[idx], rgb[idx + 1], rgb[idx + 2]);

            let white = in_range(hls, config.white_low, config.white_high);
            let yellow = in_range(hls, config.yellow_low, config.yellow_high);
            if white || yellow {
                mask[(y, x)] = 1;
            }
        }
    }

    mask
}

/// Coordinates (x, y) of all nonzero mask cells, in row-major scan order.
pub fn nonzero_points(mask: &Array2<u8>) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    for ((y, x), &v) in mask.indexed_iter() {
        if v != 0 {
            points.push((x as i32, y as i32));
        }
    }
    points
}
