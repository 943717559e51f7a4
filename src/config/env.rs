use crate::config::{
    GithubConfig, HostingConfig, HostingKind, ReaperConfig, RunConfig, S3Config, StaticDirConfig,
    StoreConfig, DEFAULT_ANALYTICS_TABLE, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_CONCURRENCY,
    DEFAULT_GITHUB_API_BASE, DEFAULT_PORTFOLIOS_TABLE, DEFAULT_S3_PREFIX, DEFAULT_S3_REGION,
};
use crate::utils::error::{ReaperError, Result};
use std::str::FromStr;

impl ReaperConfig {
    /// Builds the configuration from process environment variables.
    ///
    /// `SUPABASE_URL`, `SUPABASE_KEY`, `GITHUB_TOKEN` and `GITHUB_USER` are the
    /// names the scheduled workflow already exports.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| ReaperError::MissingConfigError {
                field: name.to_string(),
            })
        };
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let provider = match lookup("HOSTING_PROVIDER") {
            Some(value) => HostingKind::from_str(&value)?,
            None => HostingKind::Github,
        };

        let github = match provider {
            HostingKind::Github => Some(GithubConfig {
                token: required("GITHUB_TOKEN")?,
                owner: required("GITHUB_USER")?,
                api_base: or_default("GITHUB_API_BASE", DEFAULT_GITHUB_API_BASE),
            }),
            _ => None,
        };
        let static_dir = match provider {
            HostingKind::StaticDir => Some(StaticDirConfig {
                root: required("STATIC_DIR_ROOT")?,
            }),
            _ => None,
        };
        let s3 = match provider {
            HostingKind::S3 => Some(S3Config {
                bucket: required("S3_BUCKET")?,
                prefix: or_default("S3_PREFIX", DEFAULT_S3_PREFIX),
                region: or_default("S3_REGION", DEFAULT_S3_REGION),
            }),
            _ => None,
        };

        Ok(Self {
            store: StoreConfig {
                url: required("SUPABASE_URL")?,
                api_key: required("SUPABASE_KEY")?,
                portfolios_table: or_default("PORTFOLIOS_TABLE", DEFAULT_PORTFOLIOS_TABLE),
                analytics_table: or_default("ANALYTICS_TABLE", DEFAULT_ANALYTICS_TABLE),
            },
            hosting: HostingConfig {
                provider,
                github,
                static_dir,
                s3,
            },
            reaper: RunConfig {
                concurrency: parse_or(
                    "REAPER_CONCURRENCY",
                    lookup("REAPER_CONCURRENCY"),
                    DEFAULT_CONCURRENCY,
                )?,
                call_timeout_secs: parse_or(
                    "REAPER_CALL_TIMEOUT_SECS",
                    lookup("REAPER_CALL_TIMEOUT_SECS"),
                    DEFAULT_CALL_TIMEOUT_SECS,
                )?,
                dry_run: parse_flag("REAPER_DRY_RUN", lookup("REAPER_DRY_RUN"))?,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ReaperError::InvalidConfigValueError {
                field: name.to_string(),
                value: value.clone(),
                reason: "Not a valid number".to_string(),
            }),
    }
}

fn parse_flag(name: &str, raw: Option<String>) -> Result<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "" | "0" | "false" | "no") => Ok(false),
        Some(v) => Err(ReaperError::InvalidConfigValueError {
            field: name.to_string(),
            value: v,
            reason: "Expected true/false".to_string(),
        }),
    }
}
