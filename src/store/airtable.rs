use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::PayError;
use crate::models::{TransactionRecord, TransactionStatus};
use crate::store::{RecordSelector, TransactionStore};

/// Spreadsheet-style backend over the Airtable REST API. Rows live in one
/// table; lookups go through `filterByFormula`, mutations through the
/// Airtable-internal record id.
pub struct AirtableStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<AirtableRow>,
}

#[derive(Debug, Deserialize)]
struct AirtableRow {
    id: String,
    fields: TransactionRecord,
}

impl AirtableStore {
    pub fn new(api_key: &str, base_id: &str, table: &str) -> Self {
        Self::with_endpoint(
            api_key,
            format!("https://api.airtable.com/v0/{base_id}/{table}"),
        )
    }

    pub fn with_endpoint(api_key: &str, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.to_string(),
        }
    }

    fn formula(selector: &RecordSelector) -> String {
        match selector {
            RecordSelector::TransactionId(id) => format!("transactionId='{id}'"),
            RecordSelector::CustomId(id) => format!("customId='{id}'"),
        }
    }

    async fn query(&self, formula: &str) -> Result<Vec<AirtableRow>, PayError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[("filterByFormula", formula)])
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Airtable query returned {}",
                response.status()
            )));
        }
        let page: RecordPage = response.json().await.map_err(store_err)?;
        Ok(page.records)
    }

    async fn lookup(&self, selector: &RecordSelector) -> Result<Option<AirtableRow>, PayError> {
        let rows = self.query(&Self::formula(selector)).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl TransactionStore for AirtableStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), PayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "fields": record }))
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Airtable create returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn find(&self, selector: &RecordSelector) -> Result<Option<TransactionRecord>, PayError> {
        Ok(self.lookup(selector).await?.map(|row| row.fields))
    }

    async fn update_status(
        &self,
        selector: &RecordSelector,
        status: TransactionStatus,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<(), PayError> {
        let Some(row) = self.lookup(selector).await? else {
            return Ok(());
        };

        let mut fields = serde_json::json!({ "status": status });
        if let Some(expired_at) = expired_at {
            fields["expiredAt"] = serde_json::json!(expired_at);
        }

        let response = self
            .client
            .patch(format!("{}/{}", self.endpoint, row.id))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(PayError::StoreUnavailable(format!(
                "Airtable update returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<TransactionRecord>, PayError> {
        let rows = self.query("status='active'").await?;
        Ok(rows.into_iter().map(|row| row.fields).collect())
    }

    async fn ping(&self) -> bool {
        self.client
            .get(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[("maxRecords", "1")])
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

fn store_err(err: reqwest::Error) -> PayError {
    PayError::StoreUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn record_json(id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "transactionId": id,
            "amount": 5007,
            "qrImageUrl": "https://img.example/qr.png",
            "status": status,
            "expiredAt": "2026-08-06T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn find_takes_first_matching_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded(
                "filterByFormula".into(),
                "transactionId='TRX-a'".into(),
            ))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "records": [{ "id": "rec123", "fields": record_json("TRX-a", "active") }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = AirtableStore::with_endpoint("key", server.url());
        let found = store
            .find(&RecordSelector::TransactionId("TRX-a".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.transaction_id, "TRX-a");
        assert_eq!(found.status, TransactionStatus::Active);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn find_on_empty_page_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"records":[]}"#)
            .create_async()
            .await;

        let store = AirtableStore::with_endpoint("key", server.url());
        let found = store
            .find(&RecordSelector::CustomId("order-7".into()))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn update_status_patches_by_internal_record_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "records": [{ "id": "rec123", "fields": record_json("TRX-a", "active") }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/rec123")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fields": { "status": "expired" }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let store = AirtableStore::with_endpoint("key", server.url());
        store
            .update_status(
                &RecordSelector::TransactionId("TRX-a".into()),
                TransactionStatus::Expired,
                None,
            )
            .await
            .unwrap();
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn update_status_on_missing_record_is_a_no_op() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"records":[]}"#)
            .create_async()
            .await;

        let store = AirtableStore::with_endpoint("key", server.url());
        store
            .update_status(
                &RecordSelector::TransactionId("TRX-gone".into()),
                TransactionStatus::Expired,
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_errors_surface_as_store_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let store = AirtableStore::with_endpoint("key", server.url());
        let err = store
            .find(&RecordSelector::TransactionId("TRX-a".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, PayError::StoreUnavailable(_)));
    }
}
