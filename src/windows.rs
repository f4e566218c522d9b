// src/windows.rs
//
// Histogram base location and the sliding-window walk over the rectified
// lane mask. The walk is a fold over window index: each step is a pure
// function of (previous centers, band bounds, pixel set).

use crate::types::TrackingConfig;
use ndarray::{s, Array2, Axis};
use tracing::debug;

/// Starting x positions for the left and right lane searches, taken from a
/// column-sum histogram of the bottom third of the mask. The left base is
/// the argmax of the left half, the right base the argmax of the right half
/// offset by the midpoint (first maximum wins, as with numpy argmax).
pub fn histogram_bases(mask: &Array2<u8>) -> (i32, i32) {
    let (height, width) = mask.dim();
    let band_start = height * 2 / 3;
    let histogram = mask
        .slice(s![band_start.., ..])
        .mapv(u32::from)
        .sum_axis(Axis(0));

    let midpoint = width / 2;
    let left_base = argmax(histogram.iter().take(midpoint).copied());
    let right_base = midpoint + argmax(histogram.iter().skip(midpoint).copied());

    (left_base as i32, right_base as i32)
}

fn argmax(values: impl Iterator<Item = u32>) -> usize {
    let mut best = 0usize;
    let mut best_value = 0u32;
    for (i, v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Current search centers, carried from one window to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub left_x: i32,
    pub right_x: i32,
}

/// One sliding-window step: collect the pixels of each side whose y falls in
/// `[y_low, y_high)` and whose x falls within margin of that side's center,
/// then re-center any side that collected more than `minpix` pixels on the
/// truncated mean x of its collection.
pub fn window_step(
    pixels: &[(i32, i32)],
    state: WindowState,
    y_low: i32,
    y_high: i32,
    margin: i32,
    minpix: usize,
) -> (WindowState, Vec<(i32, i32)>, Vec<(i32, i32)>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for &(x, y) in pixels {
        if y < y_low || y >= y_high {
            continue;
        }
        if x >= state.left_x - margin && x < state.left_x + margin {
            left.push((x, y));
        }
        if x >= state.right_x - margin && x < state.right_x + margin {
            right.push((x, y));
        }
    }

    let mut next = state;
    if left.len() > minpix {
        next.left_x = mean_x(&left);
    }
    if right.len() > minpix {
        next.right_x = mean_x(&right);
    }

    (next, left, right)
}

fn mean_x(points: &[(i32, i32)]) -> i32 {
    let sum: i64 = points.iter().map(|&(x, _)| x as i64).sum();
    (sum as f64 / points.len() as f64) as i32
}

/// Walk the mask bottom-to-top in `n_windows` horizontal bands, accumulating
/// the left and right lane pixel sets. Greedy: centers only ever move
/// forward with the walk, no backtracking across bands.
pub fn track_lane_pixels(
    pixels: &[(i32, i32)],
    height: i32,
    bases: (i32, i32),
    config: &TrackingConfig,
) -> (Vec<(i32, i32)>, Vec<(i32, i32)>) {
    let window_height = height / config.n_windows as i32;
    let mut state = WindowState {
        left_x: bases.0,
        right_x: bases.1,
    };

    let mut left_pixels = Vec::new();
    let mut right_pixels = Vec::new();

    for window in 0..config.n_windows as i32 {
        let y_low = height - (window + 1) * window_height;
        let y_high = height - window * window_height;

        let (next, left, right) =
            window_step(pixels, state, y_low, y_high, config.margin, config.minpix);
        state = next;
        left_pixels.extend(left);
        right_pixels.extend(right);
    }

    debug!(
        left = left_pixels.len(),
        right = right_pixels.len(),
        "sliding-window walk finished"
    );

    (left_pixels, right_pixels)
}
