//! Shutdown and failure scenario tests
//!
//! These tests verify that:
//! - Workers stop promptly once the stop token fires
//! - Ingestion fails cleanly after the store or pubsub closes
//! - A message caught mid-delivery stays in PROCESSING

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use vitals_monitor::{DelayRange, Error, MessageStatus};

use crate::helpers::*;

#[tokio::test]
async fn test_workers_stop_promptly() {
    let pipeline = Pipeline::spawn(16);

    let started = tokio::time::Instant::now();
    pipeline.shutdown().await;

    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_ingest_after_store_close() {
    let pipeline = Pipeline::spawn(16);
    pipeline.store.close().unwrap();

    let err = pipeline
        .service
        .ingest_vital("patient-1", 120, 80, Some(Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, Error::StoreClosed);
    assert_matches!(pipeline.service.list_vitals(None), Err(Error::StoreClosed));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_ingest_after_pubsub_close_keeps_vital() {
    let pipeline = Pipeline::spawn(16);
    pipeline.pubsub.close();

    let err = pipeline
        .service
        .ingest_vital("patient-1", 200, 130, Some(Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, Error::PubSubClosed);

    // Stored before the publish attempt
    assert_eq!(pipeline.service.list_vitals(None).unwrap().len(), 1);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_invalid_vitals_are_rejected() {
    let pipeline = Pipeline::spawn(16);

    assert_matches!(
        pipeline
            .service
            .ingest_vital(" ", 120, 80, Some(Utc::now()))
            .await,
        Err(Error::InvalidVital(_))
    );
    assert_matches!(
        pipeline
            .service
            .ingest_vital("patient-1", 0, 80, Some(Utc::now()))
            .await,
        Err(Error::InvalidVital(_))
    );
    assert_matches!(
        pipeline
            .service
            .ingest_vital("patient-1", 120, 80, None::<DateTime<Utc>>)
            .await,
        Err(Error::InvalidVital(_))
    );
    assert!(pipeline.service.list_vitals(None).unwrap().is_empty());

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_stop_mid_delivery_leaves_message_processing() {
    let slow = DelayRange::new(Duration::from_secs(30), Duration::from_secs(30));
    let pipeline = Pipeline::spawn_with_delay(16, slow);

    pipeline.queue.enqueue("patient-1", "hello");

    let queue = pipeline.queue.clone();
    assert!(
        wait_for(Duration::from_millis(500), || {
            queue.list_messages()[0].status == MessageStatus::Processing
        })
        .await
    );

    let queue = pipeline.queue.clone();
    pipeline.shutdown().await;

    let messages = queue.list_messages();
    assert_eq!(messages[0].status, MessageStatus::Processing);
    assert_eq!(messages[0].sent_at, None);
}
