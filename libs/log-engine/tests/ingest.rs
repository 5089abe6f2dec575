//! Ingestion pipeline: validation, persist-before-broadcast, failure paths.

mod common;

use std::sync::Arc;

use common::{assert_silent, engine, fast_delivery, next_frame, subscriber, UnavailableStore};
use logcast_api::{LogFilter, LogRecord, LogStore, LogSubmission};
use logcast_engine::{LogEngine, LogError};

#[tokio::test]
async fn valid_submission_is_stored_and_broadcast_once() {
    let (engine, store) = engine();
    let (_auth, mut auth_out) = subscriber(&engine.hub, "auth").await;
    let (_billing, mut billing_out) = subscriber(&engine.hub, "billing").await;

    let stored = engine
        .ingestor
        .ingest(LogSubmission::new("auth", "error", "login failed"))
        .await
        .unwrap();

    assert_eq!(store.len().await, 1);
    assert!(!stored.id.is_empty());

    let frame = next_frame(&mut auth_out).await.unwrap();
    let pushed: LogRecord = serde_json::from_str(&frame).unwrap();
    assert_eq!(pushed, stored);
    assert_silent(&mut auth_out).await;
    assert_silent(&mut billing_out).await;
}

#[tokio::test]
async fn missing_message_is_rejected_before_storage() {
    let (engine, store) = engine();
    let (_auth, mut auth_out) = subscriber(&engine.hub, "auth").await;

    let submission = LogSubmission {
        service: Some("auth".into()),
        kind: Some("error".into()),
        message: None,
        timestamp: None,
    };
    let err = engine.ingestor.ingest(submission).await.unwrap_err();

    match err {
        LogError::Validation(missing) => assert_eq!(missing, vec!["message"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(store.is_empty().await);
    assert_silent(&mut auth_out).await;
}

#[tokio::test]
async fn validation_names_all_missing_fields() {
    let (engine, _store) = engine();
    let err = engine.ingestor.ingest(LogSubmission::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "missing required fields: service, type, message");
}

#[tokio::test]
async fn persistence_failure_skips_broadcast() {
    let engine = LogEngine::new(Arc::new(UnavailableStore), fast_delivery());
    let (_auth, mut auth_out) = subscriber(&engine.hub, "auth").await;

    let err = engine
        .ingestor
        .ingest(LogSubmission::new("auth", "error", "login failed"))
        .await
        .unwrap_err();

    assert!(matches!(err, LogError::Persistence(_)));
    assert_silent(&mut auth_out).await;
}

#[tokio::test]
async fn slow_subscriber_does_not_fail_ingestion() {
    let (engine, store) = engine();
    // Frames are read only after all three ingests: the later ones defer.
    let (_slow, mut slow_out) = subscriber(&engine.hub, "auth").await;

    for i in 0..3 {
        engine
            .ingestor
            .ingest(LogSubmission::new("auth", "info", &format!("event {i}")))
            .await
            .unwrap();
    }

    let records = store.query(&LogFilter::default()).await.unwrap();
    assert_eq!(records.len(), 3);

    let mut messages = Vec::new();
    for _ in 0..3 {
        let frame = next_frame(&mut slow_out).await.unwrap();
        let rec: LogRecord = serde_json::from_str(&frame).unwrap();
        messages.push(rec.message);
    }
    assert_eq!(messages, vec!["event 0", "event 1", "event 2"]);
}
