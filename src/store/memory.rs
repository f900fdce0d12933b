use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::PayError;
use crate::models::{TransactionRecord, TransactionStatus};
use crate::store::{RecordSelector, TransactionStore};

/// In-process backend. The default for development and the store the test
/// suite runs against.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), PayError> {
        self.records
            .write()
            .await
            .insert(record.transaction_id.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, selector: &RecordSelector) -> Result<Option<TransactionRecord>, PayError> {
        let records = self.records.read().await;
        let found = match selector {
            RecordSelector::TransactionId(id) => records.get(id).cloned(),
            RecordSelector::CustomId(_) => {
                records.values().find(|r| selector.matches(r)).cloned()
            }
        };
        Ok(found)
    }

    async fn update_status(
        &self,
        selector: &RecordSelector,
        status: TransactionStatus,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<(), PayError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.values_mut().find(|r| selector.matches(r)) {
            record.status = status;
            if let Some(expired_at) = expired_at {
                record.expired_at = expired_at;
            }
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<TransactionRecord>, PayError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == TransactionStatus::Active)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, custom_id: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            amount: 5000,
            qr_image_url: "https://img.example/qr.png".to_string(),
            status: TransactionStatus::Active,
            expired_at: Utc::now() + Duration::minutes(30),
            custom_id: custom_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn finds_by_either_selector() {
        let store = MemoryStore::new();
        store.create(&record("TRX-a", Some("order-7"))).await.unwrap();

        let by_id = store
            .find(&RecordSelector::TransactionId("TRX-a".into()))
            .await
            .unwrap();
        assert!(by_id.is_some());

        let by_custom = store
            .find(&RecordSelector::CustomId("order-7".into()))
            .await
            .unwrap();
        assert_eq!(by_custom.unwrap().transaction_id, "TRX-a");

        let missing = store
            .find(&RecordSelector::TransactionId("TRX-b".into()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_status_is_idempotent_and_tolerates_missing_records() {
        let store = MemoryStore::new();
        store.create(&record("TRX-a", None)).await.unwrap();

        let selector = RecordSelector::TransactionId("TRX-a".into());
        let backdated = Utc::now() - Duration::seconds(60);
        for _ in 0..3 {
            store
                .update_status(&selector, TransactionStatus::Expired, Some(backdated))
                .await
                .unwrap();
        }
        let found = store.find(&selector).await.unwrap().unwrap();
        assert_eq!(found.status, TransactionStatus::Expired);
        assert_eq!(found.expired_at, backdated);

        // Unknown selector: accepted, nothing changes.
        store
            .update_status(
                &RecordSelector::CustomId("nope".into()),
                TransactionStatus::Expired,
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_active_excludes_expired() {
        let store = MemoryStore::new();
        store.create(&record("TRX-a", None)).await.unwrap();
        store.create(&record("TRX-b", None)).await.unwrap();
        store
            .update_status(
                &RecordSelector::TransactionId("TRX-b".into()),
                TransactionStatus::Expired,
                None,
            )
            .await
            .unwrap();

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].transaction_id, "TRX-a");
    }
}
