//! Behaviour of the in-memory log store: ordering, bounds, filters, retention.

use chrono::{DateTime, Duration, TimeZone, Utc};
use logcast_api::{ErrorKind, LogFilter, LogStore, NewLogRecord, QUERY_LIMIT};
use storage_memory::MemoryLogStore;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

async fn seed(store: &MemoryLogStore, service: &str, kind: &str, ts: DateTime<Utc>) {
    store
        .insert(NewLogRecord::new(service, kind, "payload").with_timestamp(ts))
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_assigns_id_and_timestamp() {
    let store = MemoryLogStore::default();
    let before = Utc::now() - Duration::seconds(1);

    let a = store.insert(NewLogRecord::new("auth", "error", "login failed")).await.unwrap();
    let b = store.insert(NewLogRecord::new("auth", "error", "login failed")).await.unwrap();

    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
    assert!(a.timestamp >= before);
    assert_eq!(a.service, "auth");
    assert_eq!(a.kind, "error");
}

#[tokio::test]
async fn insert_keeps_supplied_timestamp() {
    let store = MemoryLogStore::default();
    let stored = store
        .insert(NewLogRecord::new("auth", "info", "ok").with_timestamp(at(1, 9)))
        .await
        .unwrap();
    assert_eq!(stored.timestamp, at(1, 9));
}

#[tokio::test]
async fn query_returns_newest_first() {
    let store = MemoryLogStore::default();
    seed(&store, "auth", "info", at(2, 0)).await;
    seed(&store, "auth", "info", at(5, 0)).await;
    seed(&store, "auth", "info", at(1, 0)).await;
    seed(&store, "auth", "info", at(3, 0)).await;

    let records = store.query(&LogFilter::default()).await.unwrap();
    let stamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![at(5, 0), at(3, 0), at(2, 0), at(1, 0)]);
}

#[tokio::test]
async fn query_is_bounded() {
    let store = MemoryLogStore::default();
    for i in 0..(QUERY_LIMIT as i64 + 50) {
        seed(&store, "auth", "info", at(1, 0) + Duration::seconds(i)).await;
    }

    let records = store.query(&LogFilter::default()).await.unwrap();
    assert_eq!(records.len(), QUERY_LIMIT);
    assert_eq!(records[0].timestamp, at(1, 0) + Duration::seconds(QUERY_LIMIT as i64 + 49));
    assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn query_combines_filters() {
    let store = MemoryLogStore::default();
    seed(&store, "auth", "error", at(1, 0)).await;
    seed(&store, "auth", "info", at(2, 0)).await;
    seed(&store, "billing", "error", at(3, 0)).await;
    seed(&store, "auth", "error", at(10, 0)).await;

    let filter = LogFilter {
        service: Some("auth".into()),
        kind: Some("error".into()),
        from: Some(at(1, 0)),
        to: Some(at(5, 0)),
    };
    let records = store.query(&filter).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, at(1, 0));
}

#[tokio::test]
async fn reversed_range_is_rejected() {
    let store = MemoryLogStore::default();
    seed(&store, "auth", "error", at(1, 0)).await;

    let filter = LogFilter {
        service: Some("auth".into()),
        from: Some(at(5, 0)),
        to: Some(at(1, 0)),
        ..Default::default()
    };
    let err = store.query(&filter).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFilter);
}

#[tokio::test]
async fn retention_evicts_oldest() {
    let store = MemoryLogStore::new(3);
    for day in 1..=5 {
        seed(&store, "auth", "info", at(day, 0)).await;
    }

    assert_eq!(store.len().await, 3);
    let records = store.query(&LogFilter::default()).await.unwrap();
    let stamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![at(5, 0), at(4, 0), at(3, 0)]);
}

#[tokio::test]
async fn timestamp_ties_prefer_latest_insert() {
    let store = MemoryLogStore::default();
    let first = store
        .insert(NewLogRecord::new("auth", "info", "first").with_timestamp(at(1, 0)))
        .await
        .unwrap();
    let second = store
        .insert(NewLogRecord::new("auth", "info", "second").with_timestamp(at(1, 0)))
        .await
        .unwrap();

    let records = store.query(&LogFilter::default()).await.unwrap();
    assert_eq!(records[0].id, second.id);
    assert_eq!(records[1].id, first.id);
}
