use crate::config::Settings;
use crate::domain::EntityId;
use crate::store::{Collection, CrmStore, StoreHttpError};
use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;
// 250ms << 5 = 8s per wait at most.
const MAX_BACKOFF_SHIFT: u32 = 5;

/// json-server style REST store: `GET/POST /<collection>`,
/// `PUT/DELETE /<collection>/<id>`.
#[derive(Debug, Clone)]
pub struct HttpJsonStore {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl HttpJsonStore {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_store_base_url()?.to_string();

        let timeout_secs = std::env::var("CRM_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("CRM_STORE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        Self::new(base_url, Duration::from_secs(timeout_secs), retries)
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build CRM store http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            retries: retries.max(1),
        })
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), collection.path())
    }

    fn item_url(&self, collection: Collection, id: &EntityId) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    async fn send(
        &self,
        method_name: &'static str,
        collection: Collection,
        url: String,
        body: Option<&Value>,
    ) -> Result<Value> {
        let method = Method::from_bytes(method_name.as_bytes())
            .with_context(|| format!("invalid http method {method_name}"))?;

        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req
            .send()
            .await
            .with_context(|| format!("CRM store request failed: {method_name} {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read CRM store response")?;

        if !status.is_success() {
            return Err(StoreHttpError {
                collection,
                method: method_name,
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("CRM store response is not valid JSON: {text}"))
    }
}

fn retry_backoff(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(BACKOFF_BASE_MS << shift)
}

#[async_trait::async_trait]
impl CrmStore for HttpJsonStore {
    fn store_name(&self) -> &'static str {
        "http_json"
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = self
                .send("GET", collection, self.collection_url(collection), None)
                .await;
            match res {
                Ok(Value::Array(rows)) => return Ok(rows),
                Ok(other) => {
                    anyhow::bail!(
                        "CRM store /{} did not return an array: {other}",
                        collection.path()
                    );
                }
                Err(err) => {
                    // A definite 4xx will not change on retry.
                    let client_error = err
                        .downcast_ref::<StoreHttpError>()
                        .is_some_and(|e| (400..500).contains(&e.status));
                    if client_error || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = retry_backoff(attempt);
                    tracing::warn!(
                        collection = collection.path(),
                        attempt,
                        ?backoff,
                        error = %err,
                        "CRM store list failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn create(&self, collection: Collection, body: &Value) -> Result<Value> {
        self.send("POST", collection, self.collection_url(collection), Some(body))
            .await
    }

    async fn update(&self, collection: Collection, id: &EntityId, body: &Value) -> Result<Value> {
        self.send("PUT", collection, self.item_url(collection, id), Some(body))
            .await
    }

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<()> {
        self.send("DELETE", collection, self.item_url(collection, id), None)
            .await?;
        Ok(())
    }
}
