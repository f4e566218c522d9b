// src/fit.rs
//
// Least-squares line fitting for one lane side. A fit is either a real
// line (centroid + principal direction, the total-least-squares line that
// cv2.fitLine DIST_L2 produces) or a vertical fallback at the destination
// rectangle edge; extrapolation is total over both variants.

use tracing::debug;

const MIN_VY: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaneFit {
    Fitted { vx: f64, vy: f64, x0: f64, y0: f64 },
    Fallback { edge_x: f64 },
}

impl LaneFit {
    /// x coordinate of the lane line at the given y.
    pub fn x_at(&self, y: f64) -> f64 {
        match *self {
            LaneFit::Fitted { vx, vy, x0, y0 } => x0 + (y - y0) * vx / vy,
            LaneFit::Fallback { edge_x } => edge_x,
        }
    }
}

/// Fit one side's accumulated pixel set. Falls back to a vertical line at
/// `edge_x` when the set is too small (underdetermined) or the fitted
/// direction is near-horizontal (extrapolation would blow up).
pub fn fit_side(points: &[(i32, i32)], min_points: usize, edge_x: f64) -> LaneFit {
    if points.len() <= min_points {
        debug!(
            count = points.len(),
            edge_x, "too few pixels for a line fit, using edge fallback"
        );
        return LaneFit::Fallback { edge_x };
    }

    let n = points.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for &(x, y) in points {
        sum_x += x as f64;
        sum_y += y as f64;
    }
    let x0 = sum_x / n;
    let y0 = sum_y / n;

    // Scatter matrix about the centroid; the principal axis is the
    // least-squares line direction.
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for &(x, y) in points {
        let dx = x as f64 - x0;
        let dy = y as f64 - y0;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let vx = theta.cos();
    let vy = theta.sin();

    if vy.abs() < MIN_VY {
        debug!(edge_x, "near-horizontal fit direction, using edge fallback");
        return LaneFit::Fallback { edge_x };
    }

    LaneFit::Fitted { vx, vy, x0, y0 }
}
