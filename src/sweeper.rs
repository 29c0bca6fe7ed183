//! Expiry Sweeper: deletes link records older than the retention window.
//! Failures never propagate to a user request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::store::LinkStore;

/// Delete every record older than `retention_secs`. Returns the number of
/// records deleted. Per-record delete failures are logged and skipped, so
/// a sweep pass always finishes the scan.
pub async fn sweep(store: &dyn LinkStore, now: i64, retention_secs: i64) -> usize {
    let records = match store.list_all().await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Sweep scan failed: {}", e);
            return 0;
        }
    };

    let mut deleted = 0;
    for (id, record) in records {
        if now - record.created_at <= retention_secs {
            continue;
        }

        match store.delete(&id).await {
            Ok(()) => {
                log::info!("Deleted old link: {}", id);
                deleted += 1;
            }
            Err(e) => {
                log::warn!("Failed to delete expired link {}: {}", id, e);
            }
        }
    }

    deleted
}

/// Fire-and-forget sweep after a successful write (`after-create` policy).
pub fn spawn_sweep(store: Arc<dyn LinkStore>, retention_secs: i64) {
    tokio::spawn(async move {
        sweep(store.as_ref(), Utc::now().timestamp(), retention_secs).await;
    });
}

/// Timer-driven sweep loop (`interval` policy). Runs until the process exits.
pub async fn run_interval(store: Arc<dyn LinkStore>, period: Duration, retention_secs: i64) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let deleted = sweep(store.as_ref(), Utc::now().timestamp(), retention_secs).await;
        if deleted > 0 {
            log::info!("Sweep removed {} expired links", deleted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryLinkStore;
    use crate::store::LinkRecord;

    const RETENTION: i64 = 86_400;

    fn record(created_at: i64) -> LinkRecord {
        LinkRecord {
            source_url: "https://youtu.be/abc123".to_string(),
            direct_url: "https://cdn/video".to_string(),
            short_url: "https://rebrand.ly/xyz".to_string(),
            title: "A Video".to_string(),
            format_id: "22".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn deletes_iff_age_exceeds_retention() {
        let store = MemoryLinkStore::new();
        let now = 1_000_000;

        store.create(&record(now - RETENTION - 1)).await.unwrap(); // expired
        store.create(&record(now - RETENTION)).await.unwrap(); // exactly at the bound: kept
        store.create(&record(now - 10)).await.unwrap(); // fresh

        let deleted = sweep(&store, now, RETENTION).await;
        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn second_sweep_is_a_no_op() {
        let store = MemoryLinkStore::new();
        let now = 1_000_000;
        store.create(&record(now - RETENTION - 500)).await.unwrap();
        store.create(&record(now - 50)).await.unwrap();

        assert_eq!(sweep(&store, now, RETENTION).await, 1);
        assert_eq!(sweep(&store, now, RETENTION).await, 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_store_sweeps_nothing() {
        let store = MemoryLinkStore::new();
        assert_eq!(sweep(&store, 1_000_000, RETENTION).await, 0);
    }

    #[tokio::test]
    async fn delete_failure_skips_the_record_and_continues() {
        let store = MemoryLinkStore::new();
        let now = 1_000_000;

        let stuck = store.create(&record(now - RETENTION - 1)).await.unwrap();
        store.create(&record(now - RETENTION - 2)).await.unwrap();
        store.failing_deletes.lock().unwrap().push(stuck.0.clone());

        // The failing record is skipped, the other expired one still goes
        let deleted = sweep(&store, now, RETENTION).await;
        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);
    }
}
