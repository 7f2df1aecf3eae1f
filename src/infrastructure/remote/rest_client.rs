use crate::application::ports::remote_store::RemoteStore;
use crate::domain::value_objects::{AccountId, RecordId, RecordPayload, TableName};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

const REST_PREFIX: &str = "rest/v1";

/// Client for a PostgREST-style table API (`/rest/v1/{table}`) with row-level security.
pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl RestRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationError("remote base_url is not set".into()))?;
        Url::parse(base_url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid remote base_url: {e}")))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::ConfigurationError("remote api_key is not set".into()))?;
        let bearer = config
            .access_token
            .clone()
            .unwrap_or_else(|| api_key.clone());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bearer,
        })
    }

    fn table_url(&self, table: TableName) -> Result<Url, AppError> {
        let raw = format!("{}/{REST_PREFIX}/{}", self.base_url, table.as_str());
        Url::parse(&raw).map_err(|e| AppError::ConfigurationError(format!("{raw}: {e}")))
    }

    fn scoped_url(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
    ) -> Result<Url, AppError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("account_id", &format!("eq.{account_id}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(target: "remote::rest", %status, context, "remote request failed");
        Err(status_error(status, context, &body))
    }
}

/// Maps an HTTP failure onto the retry classes the sync engine understands.
pub fn status_error(status: StatusCode, context: &str, body: &str) -> AppError {
    let message = if body.trim().is_empty() {
        format!("{context}: {status}")
    } else {
        format!("{context}: {status} {}", body.trim())
    };

    match status.as_u16() {
        401 | 403 => AppError::PermissionDenied(message),
        408 | 429 => AppError::RemoteUnavailable(message),
        code if code >= 500 => AppError::RemoteUnavailable(message),
        _ => AppError::RemoteRejected(message),
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn upsert(&self, table: TableName, rows: &[RecordPayload]) -> Result<(), AppError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("on_conflict", "id");
        let body: Vec<RecordPayload> = rows.iter().map(RecordPayload::without_sync_meta).collect();

        let request = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&body);
        self.send(request, &format!("upsert {table}")).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
        fields: &RecordPayload,
    ) -> Result<(), AppError> {
        let url = self.scoped_url(table, account_id, id)?;
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&fields.without_sync_meta());
        self.send(request, &format!("update {table} {id}")).await?;
        Ok(())
    }

    async fn delete(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
    ) -> Result<(), AppError> {
        let url = self.scoped_url(table, account_id, id)?;
        let request = self.request(Method::DELETE, url);
        self.send(request, &format!("delete {table} {id}")).await?;
        Ok(())
    }

    async fn select(
        &self,
        table: TableName,
        account_id: &AccountId,
    ) -> Result<Vec<RecordPayload>, AppError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("account_id", &format!("eq.{account_id}"))
            .append_pair("select", "*");

        let response = self
            .send(self.request(Method::GET, url), &format!("select {table}"))
            .await?;
        let rows: Vec<Value> = response.json().await?;

        rows.into_iter()
            .map(|row| {
                RecordPayload::new(row)
                    .map_err(|e| AppError::DeserializationError(format!("{table}: {e}")))
            })
            .collect()
    }
}
