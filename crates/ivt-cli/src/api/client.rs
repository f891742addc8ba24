//! HTTP record store client
//!
//! Every call is routed through the [`ResilientTransport`], so rate limiting
//! and dropped connections are retried before a failure is reported.

use crate::api::{endpoints, types, RecordStore};
use crate::config::Config;
use crate::error::Result;
use crate::transport::{ResilientTransport, TransportError};
use async_trait::async_trait;
use ivt_common::{IdentifierPolicy, Record, RecordId, StoredRecord};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Record store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: Client,
    api_url: String,
    transport: ResilientTransport,
    policy: IdentifierPolicy,
}

impl HttpRecordStore {
    /// Create a new client for the collection at `api_url`
    pub fn new(
        api_url: impl Into<String>,
        transport: ResilientTransport,
        timeout: Duration,
        policy: IdentifierPolicy,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            transport,
            policy,
        })
    }

    /// Create from the effective configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            ResilientTransport::new(config.retry_policy()),
            config.request_timeout(),
            config.identifier_policy()?,
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Turn non-2xx responses into a [`TransportError`] carrying the body text
async fn expect_success(response: Response) -> std::result::Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::from_status(status.as_u16(), body))
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn create(&self, record: &Record) -> std::result::Result<(), TransportError> {
        let url = endpoints::collection_url(&self.api_url);
        let (client, url) = (&self.client, url.as_str());

        self.transport
            .perform("create", || async move {
                let response = client.post(url).json(record).send().await?;
                expect_success(response).await.map(drop)
            })
            .await?;

        debug!(fields = record.len(), "Record created");
        Ok(())
    }

    async fn list(&self) -> std::result::Result<Vec<StoredRecord>, TransportError> {
        let url = endpoints::collection_url(&self.api_url);
        let (client, url) = (&self.client, url.as_str());

        let body: Value = self
            .transport
            .perform("list", || async move {
                let response = expect_success(client.get(url).send().await?).await?;
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| TransportError::Decode(e.to_string()))
            })
            .await?;

        let records = types::parse_listing(&body, &self.policy);
        debug!(count = records.len(), "Listing loaded");
        Ok(records)
    }

    async fn delete(&self, id: &RecordId) -> std::result::Result<(), TransportError> {
        let url = endpoints::record_url(&self.api_url, id);
        let (client, url) = (&self.client, url.as_str());

        // No body, so no content type either
        self.transport
            .perform("delete", || async move {
                let response = client.delete(url).send().await?;
                expect_success(response).await.map(drop)
            })
            .await?;

        debug!(id = %id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::transport::RetryPolicy;
    use ivt_common::FieldValue;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpRecordStore {
        HttpRecordStore::new(
            format!("{}/api/inventario", server.uri()),
            ResilientTransport::new(RetryPolicy::new(3, Duration::from_millis(5))),
            Duration::from_secs(5),
            IdentifierPolicy::default(),
        )
        .unwrap()
    }

    fn sample() -> Record {
        let mut record = Record::new();
        record.insert("descricao", "Kit Ferramentas".into());
        record.insert("EAN", FieldValue::Number(7891234567892.0));
        record
    }

    #[tokio::test]
    async fn test_create_posts_typed_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/inventario"))
            .and(body_json(json!({"descricao": "Kit Ferramentas", "EAN": 7891234567892_i64})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).create(&sample()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_retries_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("too many"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).create(&sample()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("codigo is required"))
            .expect(1)
            .mount(&server)
            .await;

        let err = store(&server).create(&sample()).await.unwrap_err();
        assert_eq!(err.to_string(), "Status 400: codigo is required");
    }

    #[tokio::test]
    async fn test_list_accepts_wrapped_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/inventario"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": 1, "descricao": "A"}, {"descricao": "no id"}]
            })))
            .mount(&server)
            .await;

        let records = store(&server).list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(RecordId::Number(1)));
        assert!(!records[1].is_deletable());
    }

    #[tokio::test]
    async fn test_list_rejects_non_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = store(&server).list().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_delete_targets_record_url() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/inventario/42"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/inventario/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let store = store(&server);
        store.delete(&RecordId::Number(42)).await.unwrap();
        let err = store.delete(&RecordId::Number(404)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_network_error() {
        let store = HttpRecordStore::new(
            "http://127.0.0.1:9/api",
            ResilientTransport::new(RetryPolicy::new(1, Duration::from_millis(1))),
            Duration::from_secs(2),
            IdentifierPolicy::default(),
        )
        .unwrap();

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
