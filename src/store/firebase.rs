use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PayError;
use crate::models::{TransactionRecord, TransactionStatus};
use crate::store::{RecordSelector, TransactionStore};

/// Realtime-database backend over the Firebase RTDB REST surface. Rows live
/// under `/transactions/<transactionId>`; custom-id and status lookups use
/// shallow `orderBy`/`equalTo` queries.
pub struct FirebaseStore {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(database_url: impl Into<String>, auth_token: Option<String>) -> Self {
        let mut database_url = database_url.into();
        while database_url.ends_with('/') {
            database_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            database_url,
            auth_token,
        }
    }

    fn row_url(&self, transaction_id: &str) -> String {
        format!("{}/transactions/{}.json", self.database_url, transaction_id)
    }

    fn collection_url(&self) -> String {
        format!("{}/transactions.json", self.database_url)
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.auth_token
            .as_ref()
            .map(|token| vec![("auth", token.clone())])
            .unwrap_or_default()
    }

    /// `orderBy`/`equalTo` filter; both operands are JSON-quoted strings.
    async fn query_equal(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<TransactionRecord>, PayError> {
        let mut params = self.auth_query();
        let order_by = format!("\"{field}\"");
        let equal_to = format!("\"{value}\"");
        params.push(("orderBy", order_by));
        params.push(("equalTo", equal_to));

        let response = self
            .client
            .get(self.collection_url())
            .query(&params)
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Firebase query returned {}",
                response.status()
            )));
        }
        let rows: Option<HashMap<String, TransactionRecord>> =
            response.json().await.map_err(store_err)?;
        Ok(rows.map(|map| map.into_values().collect()).unwrap_or_default())
    }
}

#[async_trait]
impl TransactionStore for FirebaseStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), PayError> {
        let response = self
            .client
            .put(self.row_url(&record.transaction_id))
            .query(&self.auth_query())
            .json(record)
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Firebase create returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn find(&self, selector: &RecordSelector) -> Result<Option<TransactionRecord>, PayError> {
        match selector {
            RecordSelector::TransactionId(id) => {
                let response = self
                    .client
                    .get(self.row_url(id))
                    .query(&self.auth_query())
                    .send()
                    .await
                    .map_err(store_err)?;
                if !response.status().is_success() {
                    return Err(PayError::StoreUnavailable(format!(
                        "Firebase find returned {}",
                        response.status()
                    )));
                }
                // A missing row reads back as JSON null.
                let record: Option<TransactionRecord> =
                    response.json().await.map_err(store_err)?;
                Ok(record)
            }
            RecordSelector::CustomId(id) => {
                let mut rows = self.query_equal("customId", id).await?;
                Ok(rows.pop())
            }
        }
    }

    async fn update_status(
        &self,
        selector: &RecordSelector,
        status: TransactionStatus,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<(), PayError> {
        let Some(record) = self.find(selector).await? else {
            return Ok(());
        };

        let mut patch = serde_json::json!({ "status": status });
        if let Some(expired_at) = expired_at {
            patch["expiredAt"] = serde_json::json!(expired_at);
        }

        let response = self
            .client
            .patch(self.row_url(&record.transaction_id))
            .query(&self.auth_query())
            .json(&patch)
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Firebase update returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<TransactionRecord>, PayError> {
        self.query_equal("status", "active").await
    }

    async fn ping(&self) -> bool {
        let mut params = self.auth_query();
        params.push(("shallow", "true".to_string()));
        self.client
            .get(self.collection_url())
            .query(&params)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

fn store_err(err: reqwest::Error) -> PayError {
    PayError::StoreUnavailable(err.to_string())
}
