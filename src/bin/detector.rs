// src/bin/detector.rs
//
// Standalone video object detector. Reads a video file, runs YOLO with
// track-id assignment and streams one JSON record per frame to stdout,
// followed by a summary record. Fatal setup errors go to stderr as a
// single JSON record so the consuming process can surface them.

use anyhow::Result;
use lane_service::detection::YoloDetector;
use lane_service::tracker::IouTracker;
use lane_service::video::VideoReader;
use serde::Serialize;
use serde_json::Map;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

const CONFIDENCE_THRESHOLD: f32 = 0.10;
const TRACKER_IOU_THRESHOLD: f32 = 0.35;
const TRACKER_MAX_MISSES: u32 = 30;
const DEFAULT_MODEL_PATH: &str = "models/yolov8s.onnx";

#[derive(Serialize)]
struct BoxRecord {
    id: u64,
    class: &'static str,
    conf: f64,
    x_min: i32,
    y_min: i32,
    x_max: i32,
    y_max: i32,
}

#[derive(Serialize)]
struct FrameRecord {
    #[serde(rename = "type")]
    kind: &'static str,
    frame_id: i32,
    total_frames: i32,
    boxes: Vec<BoxRecord>,
}

#[derive(Serialize)]
struct SummaryRecord {
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'static str,
    message: String,
    time: f64,
    detections: Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorRecord {
    status: &'static str,
    message: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lane_service=warn,ort=warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(video_path) = std::env::args().nth(1) else {
        report_fatal("Usage: detector <video_path>".to_string());
        std::process::exit(1);
    };

    if let Err(e) = run(&video_path) {
        report_fatal(format!("{e:#}"));
        std::process::exit(1);
    }
}

fn report_fatal(message: String) {
    let record = ErrorRecord {
        status: "error",
        message,
    };
    if let Ok(json) = serde_json::to_string(&record) {
        let _ = writeln!(std::io::stderr(), "{json}");
    }
}

fn run(video_path: &str) -> Result<()> {
    let model_path =
        std::env::var("DETECTOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());

    let mut detector = YoloDetector::new(&model_path)
        .map_err(|e| anyhow::anyhow!("Failed to load YOLO model: {e:#}"))?;
    let mut reader = VideoReader::open(Path::new(video_path))?;
    let mut tracker = IouTracker::new(TRACKER_IOU_THRESHOLD, TRACKER_MAX_MISSES);

    let total_frames = reader.total_frames;
    let mut frame_id = 0i32;
    let start = Instant::now();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut class_counts: HashMap<&'static str, u64> = HashMap::new();

    while let Some(frame) = reader.read_frame()? {
        let detections = detector.detect(
            &frame.data,
            frame.width,
            frame.height,
            CONFIDENCE_THRESHOLD,
        )?;
        let tracks = tracker.update(&detections);

        let boxes = tracks
            .iter()
            .map(|track| {
                let class = lane_service::detection::COCO_CLASSES
                    .get(track.class_id)
                    .copied()
                    .unwrap_or("unknown");
                *class_counts.entry(class).or_insert(0) += 1;
                BoxRecord {
                    id: track.id,
                    class,
                    conf: (track.confidence as f64 * 100.0).round() / 100.0,
                    x_min: track.bbox[0] as i32,
                    y_min: track.bbox[1] as i32,
                    x_max: track.bbox[2] as i32,
                    y_max: track.bbox[3] as i32,
                }
            })
            .collect();

        let record = FrameRecord {
            kind: "frame_data",
            frame_id,
            total_frames,
            boxes,
        };
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
        out.flush()?;

        frame_id += 1;
    }

    let elapsed = start.elapsed().as_secs_f64();
    let summary = SummaryRecord {
        kind: "summary",
        status: "success",
        message: format!("Analysis complete. {frame_id} frames processed."),
        time: (elapsed * 100.0).round() / 100.0,
        detections: Map::new(),
    };
    writeln!(out, "{}", serde_json::to_string(&summary)?)?;
    out.flush()?;

    info!(
        "Processed {} frames in {:.2}s, {} distinct classes seen",
        frame_id,
        elapsed,
        class_counts.len()
    );
    Ok(())
}
