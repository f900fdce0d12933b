use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::error::PayError;
use crate::models::TransactionStatus;
use crate::store::{RecordSelector, TransactionStore};

/// Background pass that expires overdue records, so transactions nobody is
/// polling still reach their terminal state. The sweeper owns its own
/// single-flight guard; a tick that lands while the previous pass is still
/// draining is skipped.
pub struct ExpirySweeper {
    store: Arc<dyn TransactionStore>,
    interval: Duration,
    in_flight: AtomicBool,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn TransactionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!("expiry sweeper running every {:?}", self.interval);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    pub async fn run_once(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("expiry sweep already in flight, skipping tick");
            return;
        }
        if let Err(err) = self.drain().await {
            tracing::warn!("expiry sweep failed: {err}");
        }
        self.in_flight.store(false, Ordering::SeqCst);
    }

    async fn drain(&self) -> Result<(), PayError> {
        let now = Utc::now();
        let overdue: Vec<_> = self
            .store
            .list_active()
            .await?
            .into_iter()
            .filter(|record| record.expired_at < now)
            .collect();
        if overdue.is_empty() {
            return Ok(());
        }

        let updates = overdue.iter().map(|record| {
            let selector = RecordSelector::TransactionId(record.transaction_id.clone());
            async move {
                self.store
                    .update_status(&selector, TransactionStatus::Expired, None)
                    .await
            }
        });
        let results = join_all(updates).await;
        let failed = results.iter().filter(|r| r.is_err()).count();

        tracing::info!(
            expired = overdue.len() - failed,
            failed,
            "expiry sweep pass finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionRecord;
    use crate::store::MemoryStore;
    use chrono::Duration as ChronoDuration;

    fn record(id: &str, minutes_from_now: i64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            amount: 5000,
            qr_image_url: "https://img.example/qr.png".to_string(),
            status: TransactionStatus::Active,
            expired_at: Utc::now() + ChronoDuration::minutes(minutes_from_now),
            custom_id: None,
        }
    }

    #[tokio::test]
    async fn expires_only_overdue_records() {
        let store = Arc::new(MemoryStore::new());
        store.create(&record("TRX-old", -5)).await.unwrap();
        store.create(&record("TRX-live", 30)).await.unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), Duration::from_secs(60));
        sweeper.run_once().await;

        let old = store
            .find(&RecordSelector::TransactionId("TRX-old".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, TransactionStatus::Expired);

        let live = store
            .find(&RecordSelector::TransactionId("TRX-live".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.status, TransactionStatus::Active);
    }

    #[tokio::test]
    async fn repeated_passes_are_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.create(&record("TRX-old", -5)).await.unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), Duration::from_secs(60));
        sweeper.run_once().await;
        sweeper.run_once().await;

        let old = store
            .find(&RecordSelector::TransactionId("TRX-old".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, TransactionStatus::Expired);
    }

    #[tokio::test]
    async fn an_in_flight_pass_blocks_the_next_tick() {
        let store = Arc::new(MemoryStore::new());
        store.create(&record("TRX-old", -5)).await.unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), Duration::from_secs(60));
        sweeper.in_flight.store(true, Ordering::SeqCst);
        sweeper.run_once().await;

        // The guarded tick did nothing.
        let old = store
            .find(&RecordSelector::TransactionId("TRX-old".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, TransactionStatus::Active);

        // Releasing the guard lets the next tick drain.
        sweeper.in_flight.store(false, Ordering::SeqCst);
        sweeper.run_once().await;
        let old = store
            .find(&RecordSelector::TransactionId("TRX-old".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, TransactionStatus::Expired);
    }
}
