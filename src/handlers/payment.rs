use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::{
    error::PayError,
    models::{CancelResponse, PaymentRequest},
    services::PaymentService,
    store::RecordSelector,
};

#[derive(Clone)]
pub struct ApiState {
    pub payments: Arc<PaymentService>,
}

/// The single POST endpoint the donation form talks to. Branches on which
/// body fields are present, in the order the form's protocol fixes: status
/// poll, then cancel, then create; anything else is a bad request.
pub async fn payment_api(
    State(state): State<ApiState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Response, PayError> {
    if let (Some(total), Some(selector)) = (request.total, selector_of(&request)) {
        let status = state.payments.check_status(total, &selector).await?;
        return Ok(Json(status).into_response());
    }

    if request.action.as_deref() == Some("cancel") {
        if let Some(selector) = selector_of(&request) {
            state.payments.deactivate(&selector).await?;
            return Ok(Json(CancelResponse {
                success: true,
                message: "QRIS deactivated".to_string(),
            })
            .into_response());
        }
    }

    if let Some(amount) = request.amount {
        let created = state
            .payments
            .create(amount, request.logo_url.as_deref(), request.custom_id.clone())
            .await?;
        return Ok(Json(created).into_response());
    }

    Err(PayError::InvalidRequest)
}

/// Our generated id wins over an integrator-supplied one when both arrive.
fn selector_of(request: &PaymentRequest) -> Option<RecordSelector> {
    if let Some(id) = &request.transaction_id {
        return Some(RecordSelector::TransactionId(id.clone()));
    }
    request
        .custom_id
        .as_ref()
        .map(|id| RecordSelector::CustomId(id.clone()))
}
