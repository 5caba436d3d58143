//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - The server binds and answers over a real socket
//! - Report endpoints return the same lines as the historian
//! - Error handling is correct

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use pingwatch::{
    actors::historian::HistorianHandle,
    api::{ApiConfig, ApiState, build_router, spawn_api_server},
    config::parse_config,
    context::Context,
};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use crate::helpers::*;

fn test_state() -> (ApiState, HistorianHandle) {
    let config = parse_config(r#"{ "targets": ["gw", "dns"], "ping": { "historyLength": 5 } }"#)
        .unwrap();
    let context = Arc::new(Context::new(&config.targets, false));
    let (historian, _alerts) = spawn_historian(config.ping.history_length, &["gw", "dns"]);
    let state = ApiState::new(historian.clone(), Arc::new(config), context);
    (state, historian)
}

async fn get_json(state: ApiState, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_server_answers_on_socket() {
    let (state, _historian) = test_state();
    let config = ApiConfig::new("127.0.0.1:0".parse().unwrap());

    let addr = spawn_api_server(config, state).await.unwrap();
    assert_ne!(addr.port(), 0);

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/v1/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains(r#""status":"ok""#));
}

#[tokio::test]
async fn test_report_matches_historian() {
    let (state, historian) = test_state();
    historian.submit(round("gw", 10, 10)).await.unwrap();
    historian.submit(round("dns", 10, 0)).await.unwrap();

    let (status, body) = get_json(state, "/api/v1/report").await;

    assert_eq!(status, StatusCode::OK);
    let expected = historian.report().await.unwrap();
    assert_eq!(body["lines"], serde_json::json!(expected));
    assert!(body["lines"][0].as_str().unwrap().starts_with("dns"));
}

#[tokio::test]
async fn test_target_report_for_pending_target() {
    let (state, _historian) = test_state();

    let (status, body) = get_json(state, "/api/v1/report/dns").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["lines"][0].as_str().unwrap().ends_with("dns pending, no rounds yet"));
}

#[tokio::test]
async fn test_target_report_includes_last_reply() {
    let (state, historian) = test_state();
    historian.submit(round("gw", 10, 10)).await.unwrap();
    historian.submit(round("gw", 10, 0)).await.unwrap();

    let (status, body) = get_json(state, "/api/v1/report/gw").await;

    assert_eq!(status, StatusCode::OK);
    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].as_str().unwrap().ends_with("gw 10/20 50% loss, 10.00 ms avg, 1.00 ms mdev"));
    assert!(lines[1].as_str().unwrap().contains("last reply"));
}

#[tokio::test]
async fn test_history_serializes_tallies() {
    let (state, historian) = test_state();
    for _ in 0..7 {
        historian.submit(round("gw", 10, 9)).await.unwrap();
    }

    let (status, body) = get_json(state, "/api/v1/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let gw = &body["targets"][0];
    assert_eq!(gw["rounds"], 5);
    assert_eq!(gw["total_pings"], 50);
    assert_eq!(gw["loss_percent"], 10);
    assert_eq!(gw["pending"], false);
}

#[tokio::test]
async fn test_conf_reflects_loaded_file() {
    let (state, _historian) = test_state();

    let (status, body) = get_json(state, "/api/v1/conf").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ping"]["historyLength"], 5);
    assert_eq!(body["ping"]["lossTolerance"], 1);
    assert_eq!(body["web"]["port"], 9444);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (state, _historian) = test_state();

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
