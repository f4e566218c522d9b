// tests/http.rs
//
// End-to-end exercise of the HTTP surface without a socket: requests are
// pushed straight into the router with tower's oneshot.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{ImageFormat, RgbImage};
use lane_service::server::router;
use lane_service::types::{Config, RoiConfig};
use serde_json::Value;
use std::io::Cursor;
use tower::util::ServiceExt;

const BOUNDARY: &str = "X-LANE-TEST-BOUNDARY";

fn multipart_body(field_name: &str, filename: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn detect_request(body: Vec<u8>, stream_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/detect_lane")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(id) = stream_id {
        builder = builder.header("x-stream-id", id);
    }
    builder.body(Body::from(body)).unwrap()
}

fn black_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::new(width, height);
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Jpeg).unwrap();
    bytes.into_inner()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn expected_fallback(width: f64, height: f64) -> Vec<i64> {
    let roi = RoiConfig::default();
    vec![
        (roi.left_top[0] * width).round() as i64,
        (roi.left_top[1] * height).round() as i64,
        (roi.right_top[0] * width).round() as i64,
        (roi.right_top[1] * height).round() as i64,
        (roi.right_bottom[0] * width).round() as i64,
        (roi.right_bottom[1] * height).round() as i64,
        (roi.left_bottom[0] * width).round() as i64,
        (roi.left_bottom[1] * height).round() as i64,
    ]
}

#[tokio::test]
async fn missing_frame_field_is_a_client_error() {
    let app = router(Config::default());
    let body = multipart_body("not_frame", "x.jpg", b"irrelevant");

    let response = app.oneshot(detect_request(body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "No frame part in the request");
}

#[tokio::test]
async fn undecodable_payload_is_a_server_error() {
    let app = router(Config::default());
    let body = multipart_body("frame", "x.jpg", b"this is not a jpeg");

    let response = app.oneshot(detect_request(body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Failed to decode image or frame is empty");
}

#[tokio::test]
async fn black_frame_yields_fallback_coordinates() {
    let app = router(Config::default());
    let body = multipart_body("frame", "frame.jpg", &black_jpeg(320, 240));

    let response = app.oneshot(detect_request(body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "success");

    let coords: Vec<i64> = json["lane_coords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(coords, expected_fallback(320.0, 240.0));
}

#[tokio::test]
async fn repeated_identical_frames_smooth_to_the_same_answer() {
    let app = router(Config::default());
    let jpeg = black_jpeg(320, 240);
    let expected = expected_fallback(320.0, 240.0);

    // Averaging a constant sequence must reproduce the constant.
    for _ in 0..5 {
        let body = multipart_body("frame", "frame.jpg", &jpeg);
        let response = app
            .clone()
            .oneshot(detect_request(body, Some("smoke")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let coords: Vec<i64> = json["lane_coords"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        assert_eq!(coords, expected);
    }
}

#[tokio::test]
async fn streams_do_not_share_smoothing_history() {
    let app = router(Config::default());

    // Warm stream "a" with several small frames, then hit stream "b" with a
    // differently sized frame. If histories leaked, "b" would see a blend.
    for _ in 0..3 {
        let body = multipart_body("frame", "frame.jpg", &black_jpeg(320, 240));
        let response = app
            .clone()
            .oneshot(detect_request(body, Some("a")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = multipart_body("frame", "frame.jpg", &black_jpeg(640, 480));
    let response = app.oneshot(detect_request(body, Some("b"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let coords: Vec<i64> = json["lane_coords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(coords, expected_fallback(640.0, 480.0));
}

#[tokio::test]
async fn health_endpoint_answers() {
    let app = router(Config::default());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
