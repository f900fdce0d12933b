use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PayError;
use crate::models::{TransactionRecord, TransactionStatus};

pub mod airtable;
pub mod firebase;
pub mod memory;

pub use airtable::AirtableStore;
pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

/// Records are addressed either by our generated id or by the id a
/// third-party integrator supplied at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelector {
    TransactionId(String),
    CustomId(String),
}

impl RecordSelector {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            RecordSelector::TransactionId(id) => record.transaction_id == *id,
            RecordSelector::CustomId(id) => record.custom_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// The polymorphic record store. The payment core never knows which backend
/// is active; all failures surface as `PayError::StoreUnavailable`.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, record: &TransactionRecord) -> Result<(), PayError>;

    async fn find(&self, selector: &RecordSelector) -> Result<Option<TransactionRecord>, PayError>;

    /// Updates the stored status and, when given, the expiry timestamp.
    /// A selector matching nothing is a no-op, which keeps expiry and
    /// cancellation idempotent.
    async fn update_status(
        &self,
        selector: &RecordSelector,
        status: TransactionStatus,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<(), PayError>;

    async fn list_active(&self) -> Result<Vec<TransactionRecord>, PayError>;

    async fn ping(&self) -> bool;
}
