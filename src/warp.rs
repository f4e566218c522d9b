// src/warp.rs
//
// Perspective rectification: projective transform between the road-plane
// trapezoid and the bird's-eye rectangle, plus image warping by inverse
// mapping with bilinear sampling.

use anyhow::{anyhow, ensure, Result};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

const EPS: f64 = 1e-9;

/// Forward transform (source quad -> destination quad) and its inverse,
/// each solved exactly from the four point correspondences.
#[derive(Debug, Clone)]
pub struct PerspectiveTransform {
    pub forward: Matrix3<f64>,
    pub inverse: Matrix3<f64>,
}

impl PerspectiveTransform {
    pub fn between_quads(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Result<Self> {
        Ok(Self {
            forward: solve_homography(src, dst)?,
            inverse: solve_homography(dst, src)?,
        })
    }
}

/// Solve the 3x3 projective transform mapping each `src[i]` onto `dst[i]`,
/// with the bottom-right element pinned to 1 (the same 8x8 linear system
/// OpenCV's getPerspectiveTransform solves).
fn solve_homography(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Result<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];

        a[(2 * i, 0)] = x;
        a[(2 * i, 1)] = y;
        a[(2 * i, 2)] = 1.0;
        a[(2 * i, 6)] = -x * u;
        a[(2 * i, 7)] = -y * u;
        b[2 * i] = u;

        a[(2 * i + 1, 3)] = x;
        a[(2 * i + 1, 4)] = y;
        a[(2 * i + 1, 5)] = 1.0;
        a[(2 * i + 1, 6)] = -x * v;
        a[(2 * i + 1, 7)] = -y * v;
        b[2 * i + 1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| anyhow!("degenerate quad correspondence"))?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ))
}

/// Map points through a projective transform.
pub fn project_points(m: &Matrix3<f64>, pts: &[[f64; 2]]) -> Result<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for &[x, y] in pts {
        let v = m * Vector3::new(x, y, 1.0);
        let w = v[2];
        ensure!(
            w.is_finite() && w.abs() > EPS && v[0].is_finite() && v[1].is_finite(),
            "point ({x}, {y}) projects to infinity"
        );
        out.push([v[0] / w, v[1] / w]);
    }
    Ok(out)
}

/// Warp an RGB image into a `width x height` output by inverse mapping: each
/// output pixel samples the source at `inverse * (x, y, 1)` with bilinear
/// interpolation. Samples outside the source are black.
pub fn warp_rgb(src: &[u8], width: usize, height: usize, inverse: &Matrix3<f64>) -> Vec<u8> {
    let mut dst = vec![0u8; width * height * 3];
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    for dy in 0..height {
        for dx in 0..width {
            let v = inverse * Vector3::new(dx as f64, dy as f64, 1.0);
            if v[2].abs() <= EPS {
                continue;
            }
            let sx = v[0] / v[2];
            let sy = v[1] / v[2];
            if !sx.is_finite() || !sy.is_finite() || sx < 0.0 || sy < 0.0 || sx > max_x || sy > max_y
            {
                continue;
            }

            let sx0 = sx.floor() as usize;
            let sy0 = sy.floor() as usize;
            let sx1 = (sx0 + 1).min(width - 1);
            let sy1 = (sy0 + 1).min(height - 1);
            let fx = sx - sx0 as f64;
            let fy = sy - sy0 as f64;

            let dst_idx = (dy * width + dx) * 3;
            for c in 0..3 {
                let p00 = src[(sy0 * width + sx0) * 3 + c] as f64;
                let p10 = src[(sy0 * width + sx1) * 3 + c] as f64;
                let p01 = src[(sy1 * width + sx0) * 3 + c] as f64;
                let p11 = src[(sy1 * width + sx1) * 3 + c] as f64;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[dst_idx + c] = val.round() as u8;
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quads() -> ([[f64; 2]; 4], [[f64; 2]; 4]) {
        let (w, h) = (640.0, 360.0);
        let src = [
            [0.42 * w, 0.70 * h],
            [0.60 * w, 0.70 * h],
            [0.95 * w, 1.0 * h],
            [0.10 * w, 1.0 * h],
        ];
        let dst = [
            [0.2 * w, 0.0],
            [0.8 * w, 0.0],
            [0.8 * w, h],
            [0.2 * w, h],
        ];
        (src, dst)
    }

    #[test]
    fn maps_correspondences_exactly() {
        let (src, dst) = sample_quads();
        let t = PerspectiveTransform::between_quads(&src, &dst).unwrap();

        let projected = project_points(&t.forward, &src).unwrap();
        for (p, d) in projected.iter().zip(dst.iter()) {
            assert!((p[0] - d[0]).abs() < 1e-6, "{p:?} vs {d:?}");
            assert!((p[1] - d[1]).abs() < 1e-6, "{p:?} vs {d:?}");
        }
    }

    #[test]
    fn inverse_recovers_roi_quad() {
        let (src, dst) = sample_quads();
        let t = PerspectiveTransform::between_quads(&src, &dst).unwrap();

        let recovered = project_points(&t.inverse, &dst).unwrap();
        for (p, s) in recovered.iter().zip(src.iter()) {
            assert!((p[0] - s[0]).abs() < 1e-6, "{p:?} vs {s:?}");
            assert!((p[1] - s[1]).abs() < 1e-6, "{p:?} vs {s:?}");
        }
    }

    #[test]
    fn forward_then_inverse_is_identity() {
        let (src, dst) = sample_quads();
        let t = PerspectiveTransform::between_quads(&src, &dst).unwrap();

        let pts = [[100.0, 300.0], [320.0, 280.0], [500.0, 350.0]];
        let there = project_points(&t.forward, &pts).unwrap();
        let back = project_points(&t.inverse, &there).unwrap();
        for (p, q) in pts.iter().zip(back.iter()) {
            assert!((p[0] - q[0]).abs() < 1e-6);
            assert!((p[1] - q[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn warp_of_uniform_image_is_uniform_inside_roi() {
        let (src, dst) = sample_quads();
        let t = PerspectiveTransform::between_quads(&src, &dst).unwrap();

        let (w, h) = (640usize, 360usize);
        let img = vec![200u8; w * h * 3];
        let warped = warp_rgb(&img, w, h, &t.inverse);
        assert_eq!(warped.len(), w * h * 3);

        // The destination rectangle interior maps back inside the source
        // frame, so it must carry the uniform value.
        let probe = ((h / 2) * w + w / 2) * 3;
        assert_eq!(&warped[probe..probe + 3], &[200, 200, 200]);
    }

    #[test]
    fn collinear_quad_is_rejected() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(PerspectiveTransform::between_quads(&src, &dst).is_err());
    }
}
