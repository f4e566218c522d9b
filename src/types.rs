// src/types.rs

use serde::{Deserialize, Serialize};

/// Smoothed lane quadrilateral in original-frame coordinates, flattened to
/// (x1, y1, x2, y2, x3, y3, x4, y4) in order left-top, right-top,
/// right-bottom, left-bottom.
pub type LaneCoords = [i32; 8];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub roi: RoiConfig,
    pub segmentation: SegmentationConfig,
    pub tracking: TrackingConfig,
    pub smoothing: SmoothingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Region-of-interest trapezoid, expressed as fractions of (width, height),
/// and the fractional left/right inset of the rectified destination
/// rectangle. These are tuned constants; changing them changes behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub left_top: [f64; 2],
    pub right_top: [f64; 2],
    pub left_bottom: [f64; 2],
    pub right_bottom: [f64; 2],
    pub dst_offset: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            left_top: [0.42, 0.70],
            right_top: [0.60, 0.70],
            left_bottom: [0.10, 1.0],
            right_bottom: [0.95, 1.0],
            dst_offset: 0.2,
        }
    }
}

/// Inclusive HLS range thresholds for lane-paint pixels, in the 8-bit
/// convention (H in 0..=180, L and S in 0..=255). A pixel is a lane
/// candidate if it falls in the white range or the yellow range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub white_low: [u8; 3],
    pub white_high: [u8; 3],
    pub yellow_low: [u8; 3],
    pub yellow_high: [u8; 3],
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            white_low: [0, 200, 0],
            white_high: [255, 255, 255],
            yellow_low: [15, 30, 80],
            yellow_high: [45, 255, 255],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Number of vertical sliding windows.
    pub n_windows: u32,
    /// Half-width of each search window, in pixels.
    pub margin: i32,
    /// A window re-centers when it collects more than this many pixels.
    pub minpix: usize,
    /// Below this many mask pixels the whole detection falls back to the
    /// destination rectangle.
    pub min_lane_pixels: usize,
    /// A side needs more than this many pixels for a line fit; otherwise it
    /// falls back to a vertical line at the destination edge.
    pub min_fit_points: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            n_windows: 9,
            margin: 50,
            minpix: 50,
            min_lane_pixels: 100,
            min_fit_points: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Maximum number of recent quadrilaterals averaged per stream.
    pub history_frames: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { history_frames: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A decoded RGB frame. Width and height are fixed for the lifetime of one
/// processing call; the buffer is `width * height * 3` bytes, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.len() != self.width * self.height * 3
    }
}
