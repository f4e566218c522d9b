// tests/pipeline.rs
//
// Full-pipeline checks on synthetic road imagery: lane paint laid along the
// region-of-interest edges must be recovered close to the region corners.

use lane_service::types::{Config, Frame, RoiConfig};
use lane_service::{CoordinateSmoother, LaneAnalyzer};

fn synthetic_road(width: usize, height: usize) -> Frame {
    let roi = RoiConfig::default();
    let (w, h) = (width as f64, height as f64);
    let mut data = vec![40u8; width * height * 3];

    let mut paint_edge = |top: [f64; 2], bottom: [f64; 2]| {
        let y0 = (top[1] * h) as usize;
        let y1 = (bottom[1] * h).min(h) as usize;
        for y in y0..y1 {
            let t = (y as f64 - top[1] * h) / (bottom[1] * h - top[1] * h);
            let cx = (top[0] + t * (bottom[0] - top[0])) * w;
            let x0 = (cx - 6.0).max(0.0) as usize;
            let x1 = ((cx + 6.0) as usize).min(width - 1);
            for x in x0..=x1 {
                let idx = (y * width + x) * 3;
                data[idx] = 255;
                data[idx + 1] = 255;
                data[idx + 2] = 255;
            }
        }
    };

    paint_edge(roi.left_top, roi.left_bottom);
    paint_edge(roi.right_top, roi.right_bottom);

    Frame {
        data,
        width,
        height,
    }
}

fn roi_corners(width: f64, height: f64) -> [i32; 8] {
    let roi = RoiConfig::default();
    [
        (roi.left_top[0] * width).round() as i32,
        (roi.left_top[1] * height).round() as i32,
        (roi.right_top[0] * width).round() as i32,
        (roi.right_top[1] * height).round() as i32,
        (roi.right_bottom[0] * width).round() as i32,
        (roi.right_bottom[1] * height).round() as i32,
        (roi.left_bottom[0] * width).round() as i32,
        (roi.left_bottom[1] * height).round() as i32,
    ]
}

#[test]
fn painted_lane_edges_are_recovered_near_the_roi_corners() {
    let analyzer = LaneAnalyzer::new(Config::default());
    let frame = synthetic_road(640, 480);

    let coords = analyzer.detect(&frame).unwrap();
    let expected = roi_corners(640.0, 480.0);

    for (i, (&got, &want)) in coords.iter().zip(expected.iter()).enumerate() {
        assert!(
            (got - want).abs() <= 30,
            "coordinate {i}: got {got}, expected near {want}, full {coords:?}"
        );
    }
}

#[test]
fn detection_is_deterministic() {
    let analyzer = LaneAnalyzer::new(Config::default());
    let frame = synthetic_road(640, 480);

    let a = analyzer.detect(&frame).unwrap();
    let b = analyzer.detect(&frame).unwrap();
    assert_eq!(a, b);
}

#[test]
fn smoothed_sequence_converges_on_a_static_scene() {
    let analyzer = LaneAnalyzer::new(Config::default());
    let config = Config::default();
    let mut smoother = CoordinateSmoother::new(config.smoothing.history_frames);
    let frame = synthetic_road(640, 480);

    let raw = analyzer.detect(&frame).unwrap();
    let mut last = [0i32; 8];
    for _ in 0..config.smoothing.history_frames {
        last = smoother.smooth(raw);
    }
    assert_eq!(last, raw);
}
