use crate::config::GithubConfig;
use crate::domain::ports::HostingProvider;
use crate::utils::error::{ReaperError, Result};
use crate::utils::validation::validate_artifact_key;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("portfolio-reaper/", env!("CARGO_PKG_VERSION"));

/// Hosting provider for portfolios published as GitHub Pages repositories.
///
/// The artifact for key `K` is the repository `{owner}/K`.
#[derive(Debug, Clone)]
pub struct GitHubHosting {
    client: Client,
    api_base: String,
    owner: String,
    token: String,
    call_timeout: Duration,
}

impl GitHubHosting {
    pub fn new(config: &GithubConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, config, timeout))
    }

    pub fn with_client(client: Client, config: &GithubConfig, call_timeout: Duration) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            token: config.token.clone(),
            call_timeout,
        }
    }

    fn repo_url(&self, key: &str) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, key)
    }
}

#[async_trait]
impl HostingProvider for GitHubHosting {
    fn name(&self) -> &str {
        "github"
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        validate_artifact_key(key).map_err(|e| ReaperError::HostingFailure {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .delete(self.repo_url(key))
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReaperError::Timeout {
                        operation: "delete_artifact".to_string(),
                        after: self.call_timeout,
                    }
                } else {
                    ReaperError::HttpError(e)
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        if status.is_success() {
            tracing::debug!(key, owner = %self.owner, "Repository deleted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        classify_failure(key, status, &headers, &body)
    }
}

/// Maps a non-2xx answer to the reaper's error kinds; 404 counts as already deleted.
pub fn classify_failure(
    key: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Result<()> {
    let message = api_message(body).unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::NOT_FOUND => {
            tracing::debug!(key, "Repository already absent");
            Ok(())
        }
        StatusCode::UNAUTHORIZED => Err(ReaperError::HostingNotAuthorized {
            key: key.to_string(),
            message,
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(ReaperError::HostingRateLimited {
            key: key.to_string(),
            retry_after: retry_after(headers),
        }),
        // GitHub reports primary and secondary rate limits as 403
        StatusCode::FORBIDDEN if is_rate_limited(headers, body) => {
            Err(ReaperError::HostingRateLimited {
                key: key.to_string(),
                retry_after: retry_after(headers),
            })
        }
        StatusCode::FORBIDDEN => Err(ReaperError::HostingNotAuthorized {
            key: key.to_string(),
            message,
        }),
        _ => Err(ReaperError::HostingFailure {
            key: key.to_string(),
            message: format!("{}: {}", status, message),
        }),
    }
}

fn is_rate_limited(headers: &HeaderMap, body: &str) -> bool {
    let exhausted = header_str(headers, "x-ratelimit-remaining")
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    exhausted
        || headers.contains_key(RETRY_AFTER)
        || body.to_ascii_lowercase().contains("rate limit")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds =
        header_str(headers, RETRY_AFTER.as_str()).and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(secs) = seconds {
        return Some(Duration::from_secs(secs));
    }

    let reset = header_str(headers, "x-ratelimit-reset")?
        .trim()
        .parse::<i64>()
        .ok()?;
    let wait = reset - Utc::now().timestamp();
    Some(Duration::from_secs(wait.max(0) as u64))
}

fn api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
