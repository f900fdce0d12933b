use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TransactionRecord;

/// Body of the single POST endpoint. Every field is optional; the handler
/// branches on which ones are present.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Option<u64>,
    pub logo_url: Option<String>,
    pub total: Option<u64>,
    pub transaction_id: Option<String>,
    pub action: Option<String>,
    pub custom_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub paid: bool,
    /// `null` whenever the transaction is inactive.
    pub info: Option<TransactionRecord>,
    pub inactive: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub qr_image_url: String,
    /// The donation amount as requested, before the admin fee.
    pub nominal: u64,
    pub fee: u64,
    pub total: u64,
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: bool,
    pub gateway: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}
