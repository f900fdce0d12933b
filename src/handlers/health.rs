use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    models::HealthStatus,
    services::SettlementGateway,
    store::TransactionStore,
};

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn TransactionStore>,
    pub gateway: Arc<SettlementGateway>,
    pub started_at: Instant,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    let store_ok = state.store.ping().await;
    let gateway_ok = state.gateway.ping().await;

    let status = if store_ok && gateway_ok {
        "healthy"
    } else if store_ok {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_ok,
        gateway: gateway_ok,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
