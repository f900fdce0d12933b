use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use qris_pay::{
    config::{Config, StoreBackend},
    handlers::{health_check, payment_api, ApiState, HealthState},
    qris::QrisTemplate,
    services::{
        ExpirySweeper, PaymentService, PaymentSettings, QrImagePublisher, SettlementGateway,
        SystemRandom,
    },
    store::{AirtableStore, FirebaseStore, MemoryStore, TransactionStore},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting qris-pay API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    let template = QrisTemplate::parse(&config.qris_static_code)
        .context("QRIS_STATIC_CODE is not a usable merchant template")?;

    // Initialize collaborators
    let store = build_store(&config)?;
    let gateway = Arc::new(SettlementGateway::new(
        config.gateway_base_url.clone(),
        config.merchant_id.clone(),
        config.merchant_token.clone(),
    ));
    let publisher = Arc::new(QrImagePublisher::new(config.cdn_upload_url.clone()));

    let payments = Arc::new(PaymentService::new(
        template,
        store.clone(),
        gateway.clone(),
        publisher,
        Arc::new(SystemRandom),
        PaymentSettings {
            fee_min: config.admin_fee_min,
            fee_max: config.admin_fee_max,
            expired_minutes: config.qris_expired_minutes,
        },
    ));

    // Background expiry sweep
    Arc::new(ExpirySweeper::new(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    ))
    .spawn();

    // Build application state
    let api_state = ApiState {
        payments: payments.clone(),
    };
    let health_state = HealthState {
        store,
        gateway,
        started_at: Instant::now(),
    };

    // Build router
    let app = Router::new()
        .route("/api", post(payment_api))
        .with_state(api_state)
        .route("/health", get(health_check))
        .with_state(health_state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::default().include_headers(true)),
                )
                .layer(CorsLayer::permissive()),
        );

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Payment endpoint: http://{}/api", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_store(config: &Config) -> Result<Arc<dyn TransactionStore>> {
    let store: Arc<dyn TransactionStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Airtable => {
            let api_key = config
                .airtable_api_key
                .as_deref()
                .context("AIRTABLE_API_KEY required")?;
            let base_id = config
                .airtable_base_id
                .as_deref()
                .context("AIRTABLE_BASE_ID required")?;
            let table = config
                .airtable_table
                .as_deref()
                .context("AIRTABLE_TABLE required")?;
            Arc::new(AirtableStore::new(api_key, base_id, table))
        }
        StoreBackend::Firebase => {
            let database_url = config
                .firebase_database_url
                .as_deref()
                .context("FIREBASE_DATABASE_URL required")?;
            Arc::new(FirebaseStore::new(
                database_url,
                config.firebase_auth_token.clone(),
            ))
        }
    };
    tracing::info!("Record store backend: {:?}", config.store_backend);
    Ok(store)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
