use crate::config::StoreConfig;
use crate::core::expiry::select_expired;
use crate::domain::model::PortfolioRecord;
use crate::domain::ports::PortfolioStore;
use crate::utils::error::{ReaperError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

const KEY_COLUMN: &str = "repo_name";
const EXPIRES_COLUMN: &str = "expires_at";

#[derive(Debug, Deserialize)]
struct PortfolioRow {
    repo_name: String,
    expires_at: String,
}

/// Portfolio store backed by Supabase's PostgREST interface.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
    portfolios_table: String,
    analytics_table: String,
    call_timeout: Duration,
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, config, timeout))
    }

    /// `call_timeout` should match the timeout configured on `client`.
    pub fn with_client(client: Client, config: &StoreConfig, call_timeout: Duration) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            portfolios_table: config.portfolios_table.clone(),
            analytics_table: config.analytics_table.clone(),
            call_timeout,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// PostgREST answers 200/204 whether or not any row matched.
    async fn delete_by_key(&self, table: &str, key: &str) -> Result<()> {
        let filter = format!("eq.{}", key);
        let response = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(&[(KEY_COLUMN, filter.as_str())])
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| self.transport_error("DELETE", table, e))?;

        ensure_success("DELETE", table, response).await?;
        tracing::debug!(table, key, "Deleted rows");
        Ok(())
    }

    fn transport_error(&self, method: &str, table: &str, err: reqwest::Error) -> ReaperError {
        if err.is_timeout() {
            return ReaperError::Timeout {
                operation: format!("{} {}", method, table),
                after: self.call_timeout,
            };
        }
        ReaperError::StoreUnavailable {
            message: format!("{} {}: {}", method, table, err),
        }
    }
}

#[async_trait]
impl PortfolioStore for SupabaseStore {
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<PortfolioRecord>> {
        let table = self.portfolios_table.as_str();
        let select = format!("{},{}", KEY_COLUMN, EXPIRES_COLUMN);
        let before = format!("lt.{}", now.to_rfc3339_opts(SecondsFormat::Millis, true));

        tracing::debug!(table, "Querying expired rows");
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", select.as_str()), (EXPIRES_COLUMN, before.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error("GET", table, e))?;

        let response = ensure_success("GET", table, response).await?;
        let rows: Vec<PortfolioRow> = response
            .json()
            .await
            .map_err(|e| self.transport_error("GET", table, e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            // 伺服器已判定過期（例如 `-infinity`），無法解析時視為最早時間
            let expires_at = parse_timestamp(&row.expires_at).unwrap_or_else(|| {
                tracing::warn!(
                    key = %row.repo_name,
                    expires_at = %row.expires_at,
                    "Unparseable expiration timestamp, trusting server filter"
                );
                DateTime::<Utc>::MIN_UTC
            });
            records.push(PortfolioRecord::new(row.repo_name, expires_at));
        }

        // 伺服器已篩選，這裡再套用一次同樣的判斷
        Ok(select_expired(&records, now))
    }

    async fn delete_record(&self, key: &str) -> Result<()> {
        self.delete_by_key(&self.portfolios_table, key).await
    }

    async fn delete_analytics(&self, key: &str) -> Result<()> {
        self.delete_by_key(&self.analytics_table, key).await
    }
}

async fn ensure_success(method: &str, table: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ReaperError::StoreUnavailable {
        message: format!(
            "{} {} returned {}: {}",
            method,
            table,
            status,
            body.chars().take(200).collect::<String>()
        ),
    })
}

/// Accepts `timestamptz` output and offset-less `timestamp` output (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Postgres renders `+00` without minutes
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
