// src/pipeline.rs
//
// Per-frame lane finding: rectify the ROI trapezoid to a bird's-eye view,
// segment lane-paint pixels, walk them with sliding windows, fit one line
// per side and project the four corner points back to frame coordinates.
// Smoothing across frames lives in smoother.rs; this stage is stateless.

use crate::fit::{fit_side, LaneFit};
use crate::mask::{lane_mask, nonzero_points};
use crate::types::{Config, Frame, LaneCoords};
use crate::warp::{project_points, warp_rgb, PerspectiveTransform};
use crate::windows::{histogram_bases, track_lane_pixels};
use anyhow::{ensure, Result};
use tracing::debug;

pub struct LaneAnalyzer {
    config: Config,
}

impl LaneAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full per-frame pipeline and return the raw (pre-smoothing)
    /// corner quadrilateral in original-frame coordinates, flattened in
    /// order left-top, right-top, right-bottom, left-bottom.
    pub fn detect(&self, frame: &Frame) -> Result<LaneCoords> {
        ensure!(!frame.is_empty(), "frame is empty or inconsistently sized");

        let w = frame.width as f64;
        let h = frame.height as f64;
        let roi = &self.config.roi;

        let src_quad = [
            [roi.left_top[0] * w, roi.left_top[1] * h],
            [roi.right_top[0] * w, roi.right_top[1] * h],
            [roi.right_bottom[0] * w, roi.right_bottom[1] * h],
            [roi.left_bottom[0] * w, roi.left_bottom[1] * h],
        ];
        let left_edge = roi.dst_offset * w;
        let right_edge = (1.0 - roi.dst_offset) * w;
        let dst_quad = [
            [left_edge, 0.0],
            [right_edge, 0.0],
            [right_edge, h],
            [left_edge, h],
        ];

        let transform = PerspectiveTransform::between_quads(&src_quad, &dst_quad)?;

        let warped = warp_rgb(&frame.data, frame.width, frame.height, &transform.inverse);
        let mask = lane_mask(&warped, frame.width, frame.height, &self.config.segmentation);
        let pixels = nonzero_points(&mask);

        let corners = if pixels.len() < self.config.tracking.min_lane_pixels {
            // Degenerate "no lane found" frame: report the unmodified
            // destination rectangle instead of a fit.
            debug!(
                lane_pixels = pixels.len(),
                "insufficient lane pixels, falling back to destination rectangle"
            );
            dst_quad
        } else {
            let bases = histogram_bases(&mask);
            debug!(
                lane_pixels = pixels.len(),
                left_base = bases.0,
                right_base = bases.1,
                "histogram bases located"
            );

            let (left_pixels, right_pixels) =
                track_lane_pixels(&pixels, frame.height as i32, bases, &self.config.tracking);

            let min_fit = self.config.tracking.min_fit_points;
            let left_fit = fit_side(&left_pixels, min_fit, left_edge);
            let right_fit = fit_side(&right_pixels, min_fit, right_edge);
            if let (LaneFit::Fitted { .. }, LaneFit::Fitted { .. }) = (&left_fit, &right_fit) {
                debug!("both lane lines fitted");
            }

            [
                [left_fit.x_at(0.0), 0.0],
                [right_fit.x_at(0.0), 0.0],
                [right_fit.x_at(h), h],
                [left_fit.x_at(h), h],
            ]
        };

        let unwarped = project_points(&transform.inverse, &corners)?;

        let mut coords = [0i32; 8];
        for (i, point) in unwarped.iter().enumerate() {
            coords[2 * i] = point[0].round() as i32;
            coords[2 * i + 1] = point[1].round() as i32;
        }
        Ok(coords)
    }
}
