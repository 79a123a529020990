//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Ingestion and listing endpoints return correct responses
//! - Validation failures map to 400 with an error body
//! - A closed store maps to 503
//! - WebSocket streaming pushes message transitions

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
};
use tower::ServiceExt;
use vitals_monitor::{
    MessageStatus,
    api::types::StreamEvent,
    api::{ApiConfig, ApiState, router, spawn_api_server},
};

use crate::helpers::*;

// Helper to spawn the API on a random port in front of a running pipeline
async fn spawn_test_api(pipeline: &Pipeline) -> SocketAddr {
    let state = ApiState::new(pipeline.service.clone(), pipeline.queue.clone());
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
    };

    let (addr, _handle) = spawn_api_server(config, state, pipeline.stop.clone())
        .await
        .unwrap();
    addr
}

// Next JSON text frame from the event stream
async fn next_event(socket: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> StreamEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("no frame received")
            .unwrap()
            .unwrap();
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_ingest_and_list_vitals() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;
    let client = reqwest::Client::new();
    let taken_at = Utc::now().timestamp();

    let response = client
        .post(format!("http://{addr}/vitals"))
        .json(&json!({
            "patient_id": "patient-1",
            "systolic": 200,
            "diastolic": 130,
            "taken_at": taken_at,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["vital"]["id"], 1);
    assert_eq!(json["vital"]["patient_id"], "patient-1");
    assert_eq!(json["vital"]["taken_at"], taken_at);
    assert!(json["vital"]["received_at"].as_i64().unwrap() > 0);

    let json: Value = client
        .get(format!("http://{addr}/vitals?patient_id=patient-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["vitals"].as_array().unwrap().len(), 1);

    // The alert worker runs in the background
    let store = pipeline.store.clone();
    assert!(
        wait_for(Duration::from_millis(500), || {
            store.list_alerts().map(|a| a.len() == 1).unwrap_or(false)
        })
        .await
    );

    let json: Value = client
        .get(format!("http://{addr}/alerts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let alert = &json["alerts"][0];
    assert_eq!(alert["status"], "ACTIVE");
    assert_eq!(alert["reason"], "abnormal blood pressure 200/130");
    assert_eq!(alert["vital"]["id"], 1);
    assert_eq!(alert["vital"]["systolic"], 200);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_invalid_vital_returns_bad_request() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;
    let client = reqwest::Client::new();

    // Missing taken_at
    let response = client
        .post(format!("http://{addr}/vitals"))
        .json(&json!({ "patient_id": "patient-1", "systolic": 120, "diastolic": 80 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "taken_at is required");

    // Blank patient
    let response = client
        .post(format!("http://{addr}/vitals"))
        .json(&json!({
            "patient_id": " ",
            "systolic": 120,
            "diastolic": 80,
            "taken_at": Utc::now().timestamp(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("invalid vital"));

    assert!(pipeline.service.list_vitals(None).unwrap().is_empty());

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_malformed_body_returns_bad_request() {
    let pipeline = Pipeline::spawn(16);
    let state = ApiState::new(pipeline.service.clone(), pipeline.queue.clone());

    let response = router(state, false)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/vitals")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid request body");

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_closed_store_returns_unavailable() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;
    pipeline.store.close().unwrap();

    let response = reqwest::get(format!("http://{addr}/vitals")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "store is closed");

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_enqueue_message() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/messages"))
        .json(&json!({ "patient_id": "", "content": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("http://{addr}/messages"))
        .json(&json!({ "patient_id": "patient-1", "content": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["message"]["status"], "QUEUED");
    assert_eq!(json["message"]["sent_at"], 0);

    let queue = pipeline.queue.clone();
    assert!(
        wait_for(Duration::from_secs(1), || {
            queue.list_messages()[0].status == MessageStatus::Sent
        })
        .await
    );

    let json: Value = client
        .get(format!("http://{addr}/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["messages"][0]["status"], "SENT");
    assert!(json["messages"][0]["sent_at"].as_i64().unwrap() > 0);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_dashboard_is_served() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Vitals Monitor"));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_websocket_streams_message_updates() {
    let pipeline = Pipeline::spawn(16);
    let addr = spawn_test_api(&pipeline).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/events")).await.unwrap();

    assert_eq!(next_event(&mut socket).await, StreamEvent::Connected);

    pipeline.queue.enqueue("patient-1", "hello");

    let mut statuses = vec![];
    for _ in 0..3 {
        match next_event(&mut socket).await {
            StreamEvent::MessageUpdate { message } => {
                assert_eq!(message.patient_id, "patient-1");
                statuses.push(message.status);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(
        statuses,
        vec![
            MessageStatus::Queued,
            MessageStatus::Processing,
            MessageStatus::Sent,
        ]
    );

    pipeline.shutdown().await;
}
