use std::sync::Arc;

use chrono::Utc;

use crate::error::PayError;
use crate::models::{CreateResponse, StatusResponse, TransactionRecord, TransactionStatus};
use crate::qris::{lifecycle, Liveness, QrisTemplate};
use crate::services::{QrImagePublisher, RandomSource, SettlementGateway};
use crate::store::{RecordSelector, TransactionStore};

#[derive(Debug, Clone, Copy)]
pub struct PaymentSettings {
    pub fee_min: u64,
    pub fee_max: u64,
    pub expired_minutes: i64,
}

/// The donation flow: create a dynamic QRIS for amount + fee, poll its
/// status against the store and the settlement feed, cancel on request.
pub struct PaymentService {
    template: QrisTemplate,
    store: Arc<dyn TransactionStore>,
    gateway: Arc<SettlementGateway>,
    publisher: Arc<QrImagePublisher>,
    random: Arc<dyn RandomSource>,
    settings: PaymentSettings,
}

impl PaymentService {
    pub fn new(
        template: QrisTemplate,
        store: Arc<dyn TransactionStore>,
        gateway: Arc<SettlementGateway>,
        publisher: Arc<QrImagePublisher>,
        random: Arc<dyn RandomSource>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            template,
            store,
            gateway,
            publisher,
            random,
            settings,
        }
    }

    pub async fn create(
        &self,
        amount: u64,
        logo_url: Option<&str>,
        custom_id: Option<String>,
    ) -> Result<CreateResponse, PayError> {
        if amount == 0 {
            return Err(PayError::InvalidAmount("amount must be positive".to_string()));
        }
        let fee = self
            .random
            .fee_between(self.settings.fee_min, self.settings.fee_max);
        let total = amount
            .checked_add(fee)
            .ok_or_else(|| PayError::InvalidAmount("amount overflows".to_string()))?;

        let payload = self.template.build_payload(total)?;
        let qr_image_url = self.publisher.publish(&payload, logo_url).await?;

        let now = Utc::now();
        let record = TransactionRecord {
            transaction_id: lifecycle::transaction_id(&self.random.id_fragment(), now),
            amount: total,
            qr_image_url: qr_image_url.clone(),
            status: TransactionStatus::Active,
            expired_at: lifecycle::expiry(now, self.settings.expired_minutes),
            custom_id: custom_id.clone(),
        };
        self.store.create(&record).await?;

        tracing::info!(
            transaction_id = %record.transaction_id,
            total,
            fee,
            "QRIS transaction created"
        );

        Ok(CreateResponse {
            qr_image_url,
            nominal: amount,
            fee,
            total,
            transaction_id: record.transaction_id,
            custom_id,
        })
    }

    /// The poll endpoint. Persists the expired transition the first time an
    /// overdue record is observed; the write is idempotent, so concurrent or
    /// repeated polls settle on the same answer.
    pub async fn check_status(
        &self,
        expected_total: u64,
        selector: &RecordSelector,
    ) -> Result<StatusResponse, PayError> {
        let record = self.store.find(selector).await?;
        let liveness = lifecycle::evaluate(record.as_ref(), Utc::now());

        if let Liveness::Inactive { newly_expired } = liveness {
            if newly_expired {
                self.store
                    .update_status(selector, TransactionStatus::Expired, None)
                    .await?;
                tracing::info!(?selector, "transaction expired on status check");
            }
            return Ok(StatusResponse {
                paid: false,
                info: None,
                inactive: true,
            });
        }

        let settled = self.gateway.latest_settlement().await;
        let paid = lifecycle::is_paid(liveness, expected_total, settled);
        Ok(StatusResponse {
            paid,
            info: record,
            inactive: false,
        })
    }

    /// Forces the terminal state natural expiry reaches, with the expiry
    /// backdated a minute. Safe to repeat, safe on unknown ids.
    pub async fn deactivate(&self, selector: &RecordSelector) -> Result<(), PayError> {
        self.store
            .update_status(
                selector,
                TransactionStatus::Expired,
                Some(lifecycle::backdated_expiry(Utc::now())),
            )
            .await?;
        tracing::info!(?selector, "transaction deactivated");
        Ok(())
    }
}
