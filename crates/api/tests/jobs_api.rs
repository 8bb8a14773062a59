//! HTTP-level integration tests for job submission and status polling.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router,
//! backed by an in-memory broker. Tests that need results start a worker
//! pool on the same broker.

mod common;

use std::io::Cursor;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::{
    body_json, build_test_app, get, poll_until_terminal, post_json, post_raw, start_workers,
    submit,
};
use image::{ImageFormat, Rgb, RgbImage};
use jobwire_broker::ResultStore;
use jobwire_core::codec::{self, TaggedValue, Value};
use jobwire_core::types::JobId;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn png_base64(width: u32, height: u32) -> String {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).unwrap();
    BASE64.encode(png.into_inner())
}

fn int(value: i64) -> serde_json::Value {
    json!({"type": "int", "data": value})
}

fn image_arg(width: u32, height: u32) -> serde_json::Value {
    json!({"type": "image_bytes", "data": png_base64(width, height)})
}

// ---------------------------------------------------------------------------
// Test: resize job runs to SUCCESS and returns a 100x100 image
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resize_job_succeeds_with_resized_image() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(
        &app,
        json!({
            "domain": "image",
            "operation": "resize",
            "parameters": {"args": [image_arg(224, 224), int(100), int(100)]}
        }),
    )
    .await;

    let json = poll_until_terminal(&app, &id).await;
    assert_eq!(json["state"], "SUCCESS");
    assert!(json["result"]["elapsed"].is_number());
    assert!(json["result"]["finish_time"].is_string());

    let output: TaggedValue = serde_json::from_value(json["result"]["output"].clone()).unwrap();
    assert_eq!(output.kind, "image_bytes");
    let Value::Image(resized) = codec::decode(&output).unwrap() else {
        panic!("expected an image result");
    };
    assert_eq!(resized.dimensions(), (100, 100));
}

// ---------------------------------------------------------------------------
// Test: invalid blur radius fails the job, not the submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blur_with_negative_radius_fails() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(
        &app,
        json!({
            "task": "image.blur",
            "parameters": {"args": [image_arg(8, 8), int(-1)]}
        }),
    )
    .await;

    let json = poll_until_terminal(&app, &id).await;
    assert_eq!(json["state"], "FAILURE");
    assert!(json["error"].as_str().unwrap().contains("invalid blur radius"));
    assert!(json["traceback"].as_str().unwrap().contains(&id));
}

// ---------------------------------------------------------------------------
// Test: unknown operation in a known domain fails at execution time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_operation_fails_job() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(&app, json!({"domain": "video", "operation": "transcode"})).await;

    let json = poll_until_terminal(&app, &id).await;
    assert_eq!(json["state"], "FAILURE");
    assert_eq!(json["error"], "Unknown operation: video.transcode");
}

// ---------------------------------------------------------------------------
// Test: keyword arguments reach the operation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn algebra_job_with_kwargs() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(
        &app,
        json!({
            "domain": "algebra",
            "operation": "sub",
            "parameters": {"args": [int(10)], "kwargs": {"y": int(4)}}
        }),
    )
    .await;

    let json = poll_until_terminal(&app, &id).await;
    assert_eq!(json["state"], "SUCCESS");
    assert_eq!(json["result"]["output"], json!({"type": "int", "data": 6}));
}

// ---------------------------------------------------------------------------
// Test: legacy worker task names still dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn legacy_task_name_dispatches() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(
        &app,
        json!({
            "task": "tasks.algebra_add_x_y",
            "parameters": {"args": [int(100), int(100)], "kwargs": {}}
        }),
    )
    .await;

    let json = poll_until_terminal(&app, &id).await;
    assert_eq!(json["state"], "SUCCESS");
    assert_eq!(json["result"]["output"], json!({"type": "int", "data": 200}));
}

// ---------------------------------------------------------------------------
// Test: missing operation is rejected synchronously, no job issued
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_operation_rejected_without_job() {
    let (app, _backend) = build_test_app();

    let response = post_json(
        app,
        "/api/v1/process",
        json!({"domain": "image", "parameters": {"args": [int(1)]}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 4001);
    assert!(json.get("task_id").is_none());
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Test: non-JSON body uses the same error shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_json_body_rejected() {
    let (app, _backend) = build_test_app();

    let response = post_raw(app, "/api/v1/process", "not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 4000);
    assert_eq!(json["message"], "Invalid JSON Format");
}

// ---------------------------------------------------------------------------
// Test: undecodable image is rejected before submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn corrupt_image_rejected_with_422() {
    let (app, _backend) = build_test_app();

    let response = post_json(
        app,
        "/api/v1/process",
        json!({
            "domain": "image",
            "operation": "flip",
            "parameters": {"args": [{"type": "image_bytes", "data": BASE64.encode(b"not a png")}]}
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 4012);
}

// ---------------------------------------------------------------------------
// Test: truncated array buffer is a shape mismatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn truncated_array_rejected_with_shape_mismatch() {
    let (app, _backend) = build_test_app();

    let response = post_json(
        app,
        "/api/v1/process",
        json!({
            "task": "algebra.add",
            "parameters": {"args": [{
                "type": "ndarray",
                "data": BASE64.encode([0u8; 10]),
                "shape": [2, 3],
                "dtype": "int16"
            }]}
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 4011);
}

// ---------------------------------------------------------------------------
// Test: argument of an unknown kind cannot be transported
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_argument_kind_rejected_at_submission() {
    let (app, _backend) = build_test_app();

    let response = post_json(
        app,
        "/api/v1/process",
        json!({
            "task": "text.upper",
            "parameters": {"args": [{"type": "mystery", "data": 42}]}
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 5002);
}

// ---------------------------------------------------------------------------
// Test: a never-submitted id is consistently 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let (app, _backend) = build_test_app();

    for _ in 0..2 {
        let response = get(app.clone(), "/api/v1/status/does-not-exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["status_code"], 4040);
    }
}

// ---------------------------------------------------------------------------
// Test: without workers a submitted job reports PENDING
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_job_is_pending_until_picked_up() {
    let (app, _backend) = build_test_app();

    let id = submit(&app, json!({"task": "text.upper", "parameters": {"args": [
        {"type": "string", "data": "hello"}
    ]}}))
    .await;

    let response = get(app, &format!("/api/v1/status/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "PENDING");
    assert_eq!(json["status"], "Task is waiting to be processed");
}

// ---------------------------------------------------------------------------
// Test: polling a terminal job is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_state_is_stable_across_polls() {
    let (app, backend) = build_test_app();
    let _workers = start_workers(&backend);

    let id = submit(&app, json!({"task": "text.reverse", "parameters": {"args": [
        {"type": "string", "data": "abc"}
    ]}}))
    .await;

    let first = poll_until_terminal(&app, &id).await;
    let second = body_json(get(app.clone(), &format!("/api/v1/status/{id}")).await).await;
    assert_eq!(first, second);
    assert_eq!(first["result"]["output"]["data"], "cba");

    let record = backend.store.fetch(&JobId::from(id)).await.unwrap().unwrap();
    assert!(record.is_terminal());
}

// ---------------------------------------------------------------------------
// Test: intermediate states are passed through
// ---------------------------------------------------------------------------

#[tokio::test]
async fn started_job_reports_native_state() {
    let (app, backend) = build_test_app();

    let id = submit(&app, json!({"task": "text.lower", "parameters": {"args": [
        {"type": "string", "data": "ABC"}
    ]}}))
    .await;
    backend
        .store
        .store(&JobId::from(id.clone()), jobwire_broker::TaskRecord::started())
        .await
        .unwrap();

    let json = body_json(get(app, &format!("/api/v1/status/{id}")).await).await;
    assert_eq!(json["state"], "STARTED");
    assert_eq!(json["status"], "Task is being processed");
}
