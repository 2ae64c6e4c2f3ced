//! End-to-end provider tests: merge-on-put visible to both readers and
//! live subscribers, and fan-out under concurrent writers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;

use alertd::{Alert, AlertProvider, LabelSet, MemAlerts, MemMarker};

fn labels(name: &str) -> LabelSet {
    [("alertname".to_string(), name.to_string())].into_iter().collect()
}

#[tokio::test]
async fn test_merged_update_reaches_store_and_subscriber() {
    let provider = MemAlerts::new(
        &CancellationToken::new(),
        Arc::new(MemMarker::new()),
        Duration::from_secs(3600),
    )
    .unwrap();

    let t0 = Utc::now();
    let first = Alert::new(labels("HighLatency"), t0, t0 + ChronoDuration::minutes(10));
    let fp = first.fingerprint();
    provider.put(vec![first.clone()]).await.unwrap();

    let mut it = provider.subscribe();
    let received = it.next().await.unwrap();
    assert_eq!(received.fingerprint(), fp);
    assert_eq!(received.starts_at, t0);
    assert_eq!(received.ends_at, t0 + ChronoDuration::minutes(10));

    // Overlapping second occurrence: window must widen, and the same
    // subscriber must see a second delivery reflecting the merge.
    let second = Alert::new(
        labels("HighLatency"),
        t0 + ChronoDuration::minutes(5),
        t0 + ChronoDuration::minutes(20),
    );
    provider.put(vec![second]).await.unwrap();

    let stored = provider.get(fp).unwrap();
    assert!(stored.starts_at <= t0);
    assert!(stored.ends_at >= t0 + ChronoDuration::minutes(20));

    let update = it.next().await.unwrap();
    assert_eq!(update.fingerprint(), fp);
    assert_eq!(update.starts_at, stored.starts_at);
    assert_eq!(update.ends_at, stored.ends_at);
}

#[tokio::test]
async fn test_concurrent_writers_deliver_exactly_once() {
    let provider = Arc::new(
        MemAlerts::new(
            &CancellationToken::new(),
            Arc::new(MemMarker::new()),
            Duration::from_secs(3600),
        )
        .unwrap(),
    );

    let mut it = provider.subscribe();

    let mut writers = Vec::new();
    for w in 0..4 {
        let provider = provider.clone();
        writers.push(tokio::spawn(async move {
            let t0 = Utc::now();
            for i in 0..25 {
                let alert = Alert::new(
                    labels(&format!("alert-{w}-{i}")),
                    t0,
                    t0 + ChronoDuration::minutes(10),
                );
                provider.put(vec![alert]).await.unwrap();
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let alert = it.next().await.expect("stream ended early");
        assert!(seen.insert(alert.fingerprint()), "duplicate delivery");
    }
    assert_eq!(seen.len(), 100);
    assert!(it.try_next().is_none());
}

#[tokio::test]
async fn test_snapshot_and_live_stream_share_one_channel() {
    let provider = MemAlerts::new(
        &CancellationToken::new(),
        Arc::new(MemMarker::new()),
        Duration::from_secs(3600),
    )
    .unwrap();

    let t0 = Utc::now();
    provider
        .put(vec![
            Alert::new(labels("a"), t0, t0 + ChronoDuration::minutes(10)),
            Alert::new(labels("b"), t0, t0 + ChronoDuration::minutes(10)),
        ])
        .await
        .unwrap();

    let mut it = provider.subscribe();
    provider
        .put(vec![Alert::new(labels("c"), t0, t0 + ChronoDuration::minutes(10))])
        .await
        .unwrap();

    let mut seen = HashSet::new();
    for _ in 0..3 {
        seen.insert(it.next().await.unwrap().fingerprint());
    }
    for name in ["a", "b", "c"] {
        let fp = Alert::new(labels(name), t0, t0 + ChronoDuration::minutes(10)).fingerprint();
        assert!(seen.contains(&fp), "missing {name}");
    }
}

#[tokio::test]
async fn test_full_channel_blocks_writer_until_cancel() {
    let provider = Arc::new(
        MemAlerts::with_capacity(
            &CancellationToken::new(),
            Arc::new(MemMarker::new()),
            Duration::from_secs(3600),
            1,
        )
        .unwrap(),
    );

    let it = provider.subscribe();

    // A batch larger than the channel capacity, against a subscriber that
    // never drains: the writer must block rather than drop.
    let writer = {
        let provider = provider.clone();
        tokio::spawn(async move {
            let t0 = Utc::now();
            let batch: Vec<Alert> = (0..3)
                .map(|i| Alert::new(labels(&format!("alert-{i}")), t0, t0 + ChronoDuration::minutes(10)))
                .collect();
            provider.put(batch).await.unwrap();
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!writer.is_finished(), "writer dropped alerts instead of blocking");

    // Cancelling the subscription releases the blocked writer.
    it.close();
    tokio::time::timeout(Duration::from_secs(1), writer)
        .await
        .expect("writer still blocked after subscription cancel")
        .unwrap();
}

#[tokio::test]
async fn test_pending_iterator_early_close_stops_walk() {
    let provider = MemAlerts::new(
        &CancellationToken::new(),
        Arc::new(MemMarker::new()),
        Duration::from_secs(3600),
    )
    .unwrap();

    let t0 = Utc::now();
    let batch: Vec<Alert> = (0..50)
        .map(|i| Alert::new(labels(&format!("alert-{i}")), t0, t0 + ChronoDuration::minutes(10)))
        .collect();
    provider.put(batch).await.unwrap();

    let mut it = provider.get_pending();
    let first = it.next().await;
    assert!(first.is_some());
    it.close();

    // The walk stops within bounded time; the channel drains and closes.
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(1);
    loop {
        match tokio::time::timeout_at(deadline, it.next()).await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => panic!("iterator did not close after cancel"),
        }
    }
}
