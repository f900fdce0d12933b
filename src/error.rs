use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PayError {
    #[error("malformed QRIS template: {0}")]
    MalformedTemplate(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid request parameters")]
    InvalidRequest,

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("settlement gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("QR image pipeline failed: {0}")]
    QrImage(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal server error: {0}")]
    InternalError(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for PayError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let (status, error_code) = match &self {
            PayError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            PayError::InvalidRequest => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            PayError::MalformedTemplate(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_TEMPLATE")
            }
            PayError::StoreUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_UNAVAILABLE")
            }
            PayError::GatewayUnavailable(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_UNAVAILABLE"),
            PayError::QrImage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "QR_IMAGE_FAILED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}
