#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

use crate::core::reaper::ReaperOptions;
use crate::utils::error::{ReaperError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_secret, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORTFOLIOS_TABLE: &str = "portfolios";
pub const DEFAULT_ANALYTICS_TABLE: &str = "analytics";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_S3_PREFIX: &str = "portfolios";
pub const DEFAULT_S3_REGION: &str = "us-east-1";
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    pub store: StoreConfig,
    pub hosting: HostingConfig,
    #[serde(default)]
    pub reaper: RunConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_portfolios_table")]
    pub portfolios_table: String,
    #[serde(default = "default_analytics_table")]
    pub analytics_table: String,
}

// 避免把金鑰寫進日誌
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("portfolios_table", &self.portfolios_table)
            .field("analytics_table", &self.analytics_table)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostingKind {
    Github,
    StaticDir,
    S3,
}

impl FromStr for HostingKind {
    type Err = ReaperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(HostingKind::Github),
            "static_dir" | "static-dir" | "static" => Ok(HostingKind::StaticDir),
            "s3" | "blob" => Ok(HostingKind::S3),
            other => Err(ReaperError::InvalidConfigValueError {
                field: "hosting.provider".to_string(),
                value: other.to_string(),
                reason: "Expected one of: github, static_dir, s3".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    pub provider: HostingKind,
    pub github: Option<GithubConfig>,
    pub static_dir: Option<StaticDirConfig>,
    pub s3: Option<S3Config>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticDirConfig {
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default = "default_s3_prefix")]
    pub prefix: String,
    #[serde(default = "default_s3_region")]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            dry_run: false,
        }
    }
}

fn default_portfolios_table() -> String {
    DEFAULT_PORTFOLIOS_TABLE.to_string()
}

fn default_analytics_table() -> String {
    DEFAULT_ANALYTICS_TABLE.to_string()
}

fn default_github_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_s3_prefix() -> String {
    DEFAULT_S3_PREFIX.to_string()
}

fn default_s3_region() -> String {
    DEFAULT_S3_REGION.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

impl ReaperConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.reaper.call_timeout_secs)
    }

    pub fn reaper_options(&self) -> ReaperOptions {
        ReaperOptions {
            concurrency: self.reaper.concurrency,
            call_timeout: self.call_timeout(),
            dry_run: self.reaper.dry_run,
        }
    }

    pub fn github(&self) -> Result<&GithubConfig> {
        validate_required_field("hosting.github", &self.hosting.github)
    }

    pub fn static_dir(&self) -> Result<&StaticDirConfig> {
        validate_required_field("hosting.static_dir", &self.hosting.static_dir)
    }

    pub fn s3(&self) -> Result<&S3Config> {
        validate_required_field("hosting.s3", &self.hosting.s3)
    }
}

impl Validate for ReaperConfig {
    fn validate(&self) -> Result<()> {
        validate_url("store.url", &self.store.url)?;
        validate_secret("store.api_key", &self.store.api_key)?;
        validate_non_empty_string("store.portfolios_table", &self.store.portfolios_table)?;
        validate_non_empty_string("store.analytics_table", &self.store.analytics_table)?;

        match self.hosting.provider {
            HostingKind::Github => {
                let github = self.github()?;
                validate_secret("hosting.github.token", &github.token)?;
                validate_non_empty_string("hosting.github.owner", &github.owner)?;
                validate_url("hosting.github.api_base", &github.api_base)?;
            }
            HostingKind::StaticDir => {
                validate_path("hosting.static_dir.root", &self.static_dir()?.root)?;
            }
            HostingKind::S3 => {
                let s3 = self.s3()?;
                validate_non_empty_string("hosting.s3.bucket", &s3.bucket)?;
                validate_non_empty_string("hosting.s3.region", &s3.region)?;
            }
        }

        validate_range("reaper.concurrency", self.reaper.concurrency, 1, 32)?;
        validate_range("reaper.call_timeout_secs", self.reaper.call_timeout_secs, 1, 600)?;

        tracing::debug!("✅ Reaper configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_config() -> ReaperConfig {
        ReaperConfig {
            store: StoreConfig {
                url: "https://abc.supabase.co".to_string(),
                api_key: "service-key".to_string(),
                portfolios_table: default_portfolios_table(),
                analytics_table: default_analytics_table(),
            },
            hosting: HostingConfig {
                provider: HostingKind::Github,
                github: Some(GithubConfig {
                    token: "ghp_secret".to_string(),
                    owner: "eportfolio-bot".to_string(),
                    api_base: default_github_api_base(),
                }),
                static_dir: None,
                s3: None,
            },
            reaper: RunConfig::default(),
        }
    }

    #[test]
    fn test_valid_github_config() {
        let config = github_config();
        assert!(config.validate().is_ok());
        let options = config.reaper_options();
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.call_timeout, Duration::from_secs(30));
        assert!(!options.dry_run);
    }

    #[test]
    fn test_selected_provider_section_required() {
        let mut config = github_config();
        config.hosting.provider = HostingKind::StaticDir;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReaperError::MissingConfigError { field } if field == "hosting.static_dir"));
    }

    #[test]
    fn test_concurrency_out_of_range() {
        let mut config = github_config();
        config.reaper.concurrency = 0;
        assert!(config.validate().is_err());
        config.reaper.concurrency = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", github_config());
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("service-key"));
        assert!(rendered.contains("eportfolio-bot"));
    }

    #[test]
    fn test_hosting_kind_from_str() {
        assert_eq!("GitHub".parse::<HostingKind>().unwrap(), HostingKind::Github);
        assert_eq!("static-dir".parse::<HostingKind>().unwrap(), HostingKind::StaticDir);
        assert_eq!("blob".parse::<HostingKind>().unwrap(), HostingKind::S3);
        assert!("netlify".parse::<HostingKind>().is_err());
    }
}
