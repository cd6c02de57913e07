//! Stale ticket sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::decode::decode_ticket;
use crate::store::{StoreError, TicketStore};

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Keys listed in the index set.
    pub scanned: usize,
    /// Keys whose record was missing, unreadable or undecodable.
    pub skipped: usize,
    /// Keys removed as stale.
    pub removed: Vec<String>,
}

/// Whether a ticket created at `created` is at least `stale` old at `now`.
/// A ticket without a creation time counts as created at the epoch.
pub fn is_stale(created: Option<DateTime<Utc>>, stale: Duration, now: DateTime<Utc>) -> bool {
    let created = created.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    match (now - created).to_std() {
        Ok(age) => age >= stale,
        // Created in the future.
        Err(_) => false,
    }
}

/// Remove every ticket listed in `set_key` that is at least `stale` old.
///
/// Bad records are logged and skipped. Listing the index set and removing the
/// stale keys are the only fatal steps; removal is one batched call.
pub async fn sweep(
    store: &dyn TicketStore,
    set_key: &str,
    stale: Duration,
    now: DateTime<Utc>,
) -> Result<SweepReport, StoreError> {
    let keys = store.ticket_keys(set_key).await?;
    let mut report = SweepReport {
        scanned: keys.len(),
        ..Default::default()
    };

    for key in keys {
        let data = match store.get(&key).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(key = %key, "Ticket record missing");
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(key = %key, "Failed to read ticket: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        let ticket = match decode_ticket(&data) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(key = %key, "Failed to decode ticket: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        if is_stale(ticket.create_time, stale, now) {
            info!(
                key = %key,
                ticket_id = %ticket.id,
                created_at = ?ticket.create_time,
                "Deleting stale ticket"
            );
            report.removed.push(key);
        }
    }

    if !report.removed.is_empty() {
        store.remove(set_key, &report.removed).await?;
    }

    info!(
        scanned = report.scanned,
        skipped = report.skipped,
        removed = report.removed.len(),
        "Sweep complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::TimeZone;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tokio_test::assert_ok;

    /// In-memory store with optional failure injection.
    #[derive(Default, Clone)]
    struct MemoryStore {
        sets: Arc<RwLock<HashMap<String, BTreeSet<String>>>>,
        values: Arc<RwLock<HashMap<String, Vec<u8>>>>,
        unreadable: Arc<RwLock<BTreeSet<String>>>,
        fail_remove: Arc<RwLock<bool>>,
        remove_calls: Arc<RwLock<Vec<Vec<String>>>>,
    }

    impl MemoryStore {
        async fn put(&self, set_key: &str, key: &str, value: &[u8]) {
            self.sets
                .write()
                .await
                .entry(set_key.to_string())
                .or_default()
                .insert(key.to_string());
            self.values
                .write()
                .await
                .insert(key.to_string(), value.to_vec());
        }

        async fn index_only(&self, set_key: &str, key: &str) {
            self.sets
                .write()
                .await
                .entry(set_key.to_string())
                .or_default()
                .insert(key.to_string());
        }

        async fn members(&self, set_key: &str) -> Vec<String> {
            self.sets
                .read()
                .await
                .get(set_key)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl TicketStore for MemoryStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ticket_keys(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
            Ok(self.members(set_key).await)
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            if self.unreadable.read().await.contains(key) {
                return Err(store_error("WRONGTYPE"));
            }
            Ok(self.values.read().await.get(key).cloned())
        }

        async fn remove(&self, set_key: &str, keys: &[String]) -> Result<(), StoreError> {
            self.remove_calls.write().await.push(keys.to_vec());
            if *self.fail_remove.read().await {
                return Err(store_error("READONLY"));
            }
            if let Some(set) = self.sets.write().await.get_mut(set_key) {
                for key in keys {
                    set.remove(key);
                }
            }
            let mut values = self.values.write().await;
            for key in keys {
                values.remove(key);
            }
            Ok(())
        }
    }

    const SET: &str = "allTickets";

    fn store_error(desc: &'static str) -> StoreError {
        redis::RedisError::from((redis::ErrorKind::ResponseError, desc)).into()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(id: &str, minutes_old: i64) -> Vec<u8> {
        let created = now() - chrono::Duration::minutes(minutes_old);
        format!(r#"{{"id":"{}","create_time":"{}"}}"#, id, created.to_rfc3339()).into_bytes()
    }

    #[test]
    fn test_is_stale() {
        let ten_minutes = Duration::from_secs(600);
        let at = |m: i64| Some(now() - chrono::Duration::minutes(m));

        assert!(is_stale(at(10), ten_minutes, now()));
        assert!(is_stale(at(60), ten_minutes, now()));
        assert!(!is_stale(at(9), ten_minutes, now()));
        assert!(!is_stale(at(-5), ten_minutes, now()));
        assert!(is_stale(None, ten_minutes, now()));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_tickets() {
        let store = MemoryStore::default();
        store.put(SET, "ticket:old", &record("old", 30)).await;
        store.put(SET, "ticket:new", &record("new", 1)).await;

        let report = sweep(&store, SET, Duration::from_secs(600), now())
            .await
            .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.removed, vec!["ticket:old".to_string()]);
        assert_eq!(store.members(SET).await, vec!["ticket:new".to_string()]);
        assert!(store.values.read().await.get("ticket:old").is_none());
        assert_eq!(store.remove_calls.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_skips_bad_records() {
        let store = MemoryStore::default();
        store.put(SET, "ticket:garbage", b"not a ticket").await;
        store.index_only(SET, "ticket:gone").await;
        store.put(SET, "ticket:locked", &record("locked", 30)).await;
        store
            .unreadable
            .write()
            .await
            .insert("ticket:locked".to_string());
        let wrapped = STANDARD.encode(record("wrapped", 30));
        store.put(SET, "ticket:wrapped", wrapped.as_bytes()).await;

        let report = sweep(&store, SET, Duration::from_secs(600), now())
            .await
            .unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.removed, vec!["ticket:wrapped".to_string()]);
        assert_eq!(store.members(SET).await.len(), 3);
    }

    #[tokio::test]
    async fn test_sweep_without_stale_tickets_does_not_remove() {
        let store = MemoryStore::default();
        store.put(SET, "ticket:new", &record("new", 1)).await;

        let report = sweep(&store, SET, Duration::from_secs(600), now())
            .await
            .unwrap();

        assert!(report.removed.is_empty());
        assert!(store.remove_calls.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_empty_set() {
        let store = MemoryStore::default();
        let report = assert_ok!(sweep(&store, SET, Duration::from_secs(600), now()).await);
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn test_remove_failure_is_fatal() {
        let store = MemoryStore::default();
        store.put(SET, "ticket:old", &record("old", 30)).await;
        *store.fail_remove.write().await = true;

        let result = sweep(&store, SET, Duration::from_secs(600), now()).await;
        assert!(result.is_err());
        assert_eq!(store.members(SET).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_without_create_time_is_stale() {
        let store = MemoryStore::default();
        store.put(SET, "ticket:bare", br#"{"id":"bare"}"#).await;

        let report = sweep(&store, SET, Duration::from_secs(600), now())
            .await
            .unwrap();
        assert_eq!(report.removed, vec!["ticket:bare".to_string()]);
    }
}
