//! End-to-end tests for the ingestion pipeline
//!
//! These tests verify that:
//! - Abnormal readings raise exactly one alert
//! - Normal readings never raise alerts
//! - Alerts queue a patient message that is eventually sent
//! - Listing filters by patient

use std::time::Duration;

use chrono::{FixedOffset, TimeZone, Utc};
use pretty_assertions::assert_eq;
use vitals_monitor::{AlertStatus, MessageStatus};

use crate::helpers::*;

#[tokio::test]
async fn test_abnormal_vital_raises_alert() {
    let pipeline = Pipeline::spawn(16);

    let vital = pipeline
        .service
        .ingest_vital("patient-1", 200, 130, Some(Utc::now()))
        .await
        .unwrap();

    let store = pipeline.store.clone();
    assert!(
        wait_for(Duration::from_millis(500), || {
            store.list_alerts().map(|a| a.len() == 1).unwrap_or(false)
        })
        .await,
        "alert was not raised within 500ms"
    );

    let alerts = pipeline.service.list_alerts(None).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].vital_id, vital.id);
    assert_eq!(alerts[0].patient_id, "patient-1");
    assert_eq!(alerts[0].status, AlertStatus::Active);
    assert_eq!(alerts[0].reason, "abnormal blood pressure 200/130");

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_normal_vitals_raise_no_alert() {
    let pipeline = Pipeline::spawn(16);

    for (systolic, diastolic) in [(120, 80), (180, 120), (179, 119)] {
        pipeline
            .service
            .ingest_vital("patient-1", systolic, diastolic, Some(Utc::now()))
            .await
            .unwrap();
    }

    // One abnormal reading afterwards proves the worker got through the rest
    pipeline
        .service
        .ingest_vital("patient-2", 181, 80, Some(Utc::now()))
        .await
        .unwrap();

    let store = pipeline.store.clone();
    assert!(
        wait_for(Duration::from_millis(500), || {
            store.list_alerts().map(|a| !a.is_empty()).unwrap_or(false)
        })
        .await
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    let alerts = pipeline.service.list_alerts(None).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].patient_id, "patient-2");
    assert_eq!(pipeline.service.list_vitals(None).unwrap().len(), 4);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_alert_notifies_patient() {
    let pipeline = Pipeline::spawn(16);
    let transitions = record_transitions(&pipeline.queue);

    pipeline
        .service
        .ingest_vital("patient-1", 150, 125, Some(Utc::now()))
        .await
        .unwrap();

    let queue = pipeline.queue.clone();
    assert!(
        wait_for(Duration::from_secs(1), || {
            queue
                .list_messages()
                .first()
                .is_some_and(|m| m.status == MessageStatus::Sent)
        })
        .await,
        "message was not sent"
    );

    let messages = pipeline.queue.list_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].patient_id, "patient-1");
    assert_eq!(
        messages[0].content,
        "Alert: abnormal blood pressure 150/125. Please retake your vitals."
    );
    assert!(messages[0].sent_at.is_some());

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (1, MessageStatus::Queued),
            (1, MessageStatus::Processing),
            (1, MessageStatus::Sent),
        ]
    );

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_taken_at_is_normalized_to_utc() {
    let pipeline = Pipeline::spawn(16);

    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let local = offset.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let vital = pipeline
        .service
        .ingest_vital("  patient-1 ", 120, 80, Some(local))
        .await
        .unwrap();

    assert_eq!(vital.patient_id, "patient-1");
    assert_eq!(vital.taken_at, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    assert!(vital.received_at.is_some());

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_listing_filters_by_patient() {
    let pipeline = Pipeline::spawn(16);

    for patient in ["patient-1", "patient-2", "patient-1"] {
        pipeline
            .service
            .ingest_vital(patient, 190, 100, Some(Utc::now()))
            .await
            .unwrap();
    }

    let store = pipeline.store.clone();
    assert!(
        wait_for(Duration::from_millis(500), || {
            store.list_alerts().map(|a| a.len() == 3).unwrap_or(false)
        })
        .await
    );

    assert_eq!(pipeline.service.list_vitals(Some("patient-1")).unwrap().len(), 2);
    assert_eq!(pipeline.service.list_alerts(Some("patient-2")).unwrap().len(), 1);
    assert_eq!(pipeline.service.list_alerts(Some("  ")).unwrap().len(), 3);
    assert!(pipeline.service.list_vitals(Some("nobody")).unwrap().is_empty());

    pipeline.shutdown().await;
}
