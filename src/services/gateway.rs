use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;

use crate::error::PayError;

/// Clients poll every 5 seconds; one short-lived cache entry per merchant
/// keeps that from hammering the gateway.
const MUTATION_CACHE_TTL: Duration = Duration::from_secs(5);

/// One entry of the merchant mutation feed. Amounts arrive as decimal
/// strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Mutation {
    pub amount: String,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub brand_name: Option<String>,
    pub buyer_reff: Option<String>,
}

impl Mutation {
    pub fn amount_minor(&self) -> Option<u64> {
        self.amount.trim().parse().ok()
    }
}

#[derive(Debug, Deserialize)]
struct MutationFeed {
    data: Vec<Mutation>,
}

/// Read-only client for the settlement-status gateway (merchant mutation
/// feed). Transport and decode failures degrade to "no data": a status check
/// must report unpaid rather than fail when the gateway is down.
pub struct SettlementGateway {
    client: reqwest::Client,
    base_url: String,
    merchant: String,
    token: String,
    cache: Cache<String, Vec<Mutation>>,
}

impl SettlementGateway {
    pub fn new(base_url: impl Into<String>, merchant: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            merchant: merchant.into(),
            token: token.into(),
            cache: Cache::builder()
                .max_capacity(8)
                .time_to_live(MUTATION_CACHE_TTL)
                .build(),
        }
    }

    /// Amount of the most recent settlement the gateway reports, or `None`
    /// when the feed is empty or unreachable.
    pub async fn latest_settlement(&self) -> Option<u64> {
        match self.mutations().await {
            Ok(mutations) => mutations.first().and_then(Mutation::amount_minor),
            Err(err) => {
                tracing::warn!("settlement feed unavailable, treating as unpaid: {err}");
                None
            }
        }
    }

    async fn mutations(&self) -> Result<Vec<Mutation>, PayError> {
        if let Some(cached) = self.cache.get(&self.merchant).await {
            tracing::debug!("mutation feed cache hit for {}", self.merchant);
            return Ok(cached);
        }

        let url = format!(
            "{}/api/mutasi/qris/{}/{}",
            self.base_url, self.merchant, self.token
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PayError::GatewayUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PayError::GatewayUnavailable(format!(
                "mutation feed returned {}",
                response.status()
            )));
        }
        let feed: MutationFeed = response
            .json()
            .await
            .map_err(|e| PayError::GatewayUnavailable(e.to_string()))?;

        self.cache
            .insert(self.merchant.clone(), feed.data.clone())
            .await;
        Ok(feed.data)
    }

    pub async fn ping(&self) -> bool {
        self.mutations().await.is_ok()
    }
}
