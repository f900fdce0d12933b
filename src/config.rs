use anyhow::{bail, Context, Result};

use crate::qris::QrisTemplate;

#[derive(Debug, Clone)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Airtable,
    Firebase,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Merchant QRIS template (static code the dynamic payloads derive from)
    pub qris_static_code: String,

    // Settlement gateway (merchant mutation feed)
    pub gateway_base_url: String,
    pub merchant_id: String,
    pub merchant_token: String,

    // Donation pricing and lifetime
    pub admin_fee_min: u64,
    pub admin_fee_max: u64,
    pub qris_expired_minutes: i64,

    // Record store
    pub store_backend: StoreBackend,
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_table: Option<String>,
    pub firebase_database_url: Option<String>,
    pub firebase_auth_token: Option<String>,

    // QR image publishing (data-URL fallback when unset)
    pub cdn_upload_url: Option<String>,

    // Background expiry sweep
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment: environment.clone(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            qris_static_code: std::env::var("QRIS_STATIC_CODE")
                .context("QRIS_STATIC_CODE required")?,

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://gateway.okeconnect.com".to_string()),
            merchant_id: std::env::var("MERCHANT_ID").context("MERCHANT_ID required")?,
            merchant_token: std::env::var("MERCHANT_TOKEN").context("MERCHANT_TOKEN required")?,

            admin_fee_min: std::env::var("ADMIN_FEE_MIN")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid ADMIN_FEE_MIN")?,
            admin_fee_max: std::env::var("ADMIN_FEE_MAX")
                .unwrap_or_else(|_| "150".to_string())
                .parse()
                .context("Invalid ADMIN_FEE_MAX")?,
            qris_expired_minutes: std::env::var("QRIS_EXPIRED_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid QRIS_EXPIRED_MINUTES")?,

            store_backend: Self::parse_store_backend()?,
            airtable_api_key: std::env::var("AIRTABLE_API_KEY").ok(),
            airtable_base_id: std::env::var("AIRTABLE_BASE_ID").ok(),
            airtable_table: std::env::var("AIRTABLE_TABLE").ok(),
            firebase_database_url: std::env::var("FIREBASE_DATABASE_URL").ok(),
            firebase_auth_token: std::env::var("FIREBASE_AUTH_TOKEN").ok(),

            cdn_upload_url: std::env::var("CDN_UPLOAD_URL").ok(),

            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_store_backend() -> Result<StoreBackend> {
        let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());

        match backend.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "airtable" => Ok(StoreBackend::Airtable),
            "firebase" => Ok(StoreBackend::Firebase),
            _ => bail!("Unknown store backend: {}", backend),
        }
    }

    fn validate(&self) -> Result<()> {
        // The merchant template is load-bearing: a malformed one must stop
        // the process here, not surface per-request.
        QrisTemplate::parse(&self.qris_static_code)
            .context("QRIS_STATIC_CODE is not a usable merchant template")?;

        if !self.gateway_base_url.starts_with("http") {
            bail!("GATEWAY_BASE_URL must be HTTP(S) URL");
        }
        if self.admin_fee_min > self.admin_fee_max {
            bail!("ADMIN_FEE_MIN must not exceed ADMIN_FEE_MAX");
        }
        if self.qris_expired_minutes < 1 {
            bail!("QRIS_EXPIRED_MINUTES must be at least 1");
        }

        match self.store_backend {
            StoreBackend::Airtable => {
                if self.airtable_api_key.is_none()
                    || self.airtable_base_id.is_none()
                    || self.airtable_table.is_none()
                {
                    bail!("Airtable backend needs AIRTABLE_API_KEY, AIRTABLE_BASE_ID and AIRTABLE_TABLE");
                }
            }
            StoreBackend::Firebase => {
                if self.firebase_database_url.is_none() {
                    bail!("Firebase backend needs FIREBASE_DATABASE_URL");
                }
            }
            StoreBackend::Memory => {}
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
