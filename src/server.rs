// src/server.rs
//
// HTTP surface of the lane service. One route: POST /detect_lane with a
// multipart `frame` field carrying a JPEG. Smoothing history is keyed by
// the optional `x-stream-id` header so independent streams do not
// contaminate each other; mutation of a stream's history is serialized
// behind a mutex.

use crate::pipeline::LaneAnalyzer;
use crate::smoother::CoordinateSmoother;
use crate::types::{Config, Frame};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

const DEFAULT_STREAM: &str = "default";
const STREAM_HEADER: &str = "x-stream-id";
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    analyzer: Arc<LaneAnalyzer>,
    sessions: Arc<Mutex<HashMap<String, CoordinateSmoother>>>,
}

#[derive(Serialize)]
struct LaneResponse {
    status: &'static str,
    lane_coords: Vec<i32>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

fn error_response(code: StatusCode, message: String) -> Response {
    (
        code,
        Json(ErrorResponse {
            status: "error",
            message,
        }),
    )
        .into_response()
}

pub fn router(config: Config) -> Router {
    let state = AppState {
        analyzer: Arc::new(LaneAnalyzer::new(config.clone())),
        config: Arc::new(config),
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    Router::new()
        .route("/detect_lane", post(detect_lane))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(MAX_FRAME_BYTES))
        .with_state(state)
}

async fn detect_lane(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut frame_bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("frame") {
                    match field.bytes().await {
                        Ok(bytes) => {
                            frame_bytes = Some(bytes);
                            break;
                        }
                        Err(e) => {
                            warn!("failed to read frame field: {e}");
                            return error_response(
                                StatusCode::INTERNAL_SERVER_ERROR,
                                format!("Processing error: {e}"),
                            );
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart body: {e}");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "No frame part in the request".to_string(),
                );
            }
        }
    }

    let Some(bytes) = frame_bytes else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No frame part in the request".to_string(),
        );
    };

    let stream_id = headers
        .get(STREAM_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_STREAM)
        .to_string();

    let analyzer = state.analyzer.clone();
    let sessions = state.sessions.clone();
    let history_frames = state.config.smoothing.history_frames;

    // The pipeline is pure pixel work; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || {
        let decoded = match image::load_from_memory(&bytes) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                debug!("frame decode failed: {e}");
                return Err(DetectError::Decode);
            }
        };
        let frame = Frame {
            width: decoded.width() as usize,
            height: decoded.height() as usize,
            data: decoded.into_raw(),
        };
        if frame.is_empty() {
            return Err(DetectError::Decode);
        }

        let raw = analyzer
            .detect(&frame)
            .map_err(|e| DetectError::Processing(format!("{e:#}")))?;

        let mut sessions = sessions
            .lock()
            .map_err(|_| DetectError::Processing("smoothing history poisoned".to_string()))?;
        let smoother = sessions
            .entry(stream_id)
            .or_insert_with(|| CoordinateSmoother::new(history_frames));
        Ok(smoother.smooth(raw))
    })
    .await;

    match result {
        Ok(Ok(coords)) => Json(LaneResponse {
            status: "success",
            lane_coords: coords.to_vec(),
        })
        .into_response(),
        Ok(Err(DetectError::Decode)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to decode image or frame is empty".to_string(),
        ),
        Ok(Err(DetectError::Processing(details))) => {
            error!("lane pipeline failed: {details}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing error: {details}"),
            )
        }
        Err(e) => {
            error!("worker task failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing error: {e}"),
            )
        }
    }
}

enum DetectError {
    Decode,
    Processing(String),
}
