use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored lifecycle state. The service itself only ever writes `active` and
/// `expired`; `paid` exists because upstream feeds may carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Active,
    Expired,
    Paid,
}

/// The one persisted entity: a QRIS transaction, keyed by `transaction_id`,
/// serialized camelCase on every wire surface (store rows and API responses).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: String,
    /// Donation amount plus admin fee, in minor currency units.
    pub amount: u64,
    pub qr_image_url: String,
    pub status: TransactionStatus,
    pub expired_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_camel_case_with_lowercase_status() {
        let record = TransactionRecord {
            transaction_id: "TRX-x9y8z7w612345".to_string(),
            amount: 5055,
            qr_image_url: "https://img.example/qr.png".to_string(),
            status: TransactionStatus::Active,
            expired_at: "2026-08-06T10:00:00Z".parse().unwrap(),
            custom_id: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["transactionId"], "TRX-x9y8z7w612345");
        assert_eq!(json["status"], "active");
        assert_eq!(json["amount"], 5055);
        assert!(json.get("customId").is_none());
    }

    #[test]
    fn record_round_trips_without_custom_id() {
        let json = r#"{
            "transactionId": "TRX-abcd123499999",
            "amount": 10000,
            "qrImageUrl": "https://img.example/a.png",
            "status": "expired",
            "expiredAt": "2026-08-06T09:30:00Z"
        }"#;
        let record: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, TransactionStatus::Expired);
        assert_eq!(record.custom_id, None);
    }
}
