use crate::adapters::{GitHubHosting, StaticDirHosting, SupabaseStore};
use crate::config::{HostingKind, ReaperConfig};
use crate::core::reaper::Reaper;
use crate::domain::model::RunSummary;
use crate::domain::ports::HostingProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use chrono::Utc;

#[cfg(feature = "lambda")]
use crate::adapters::S3Hosting;
#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;

pub type ConfiguredReaper = Reaper<SupabaseStore, Box<dyn HostingProvider>>;

/// 依設定選擇託管後端
pub async fn build_hosting(config: &ReaperConfig) -> Result<Box<dyn HostingProvider>> {
    match config.hosting.provider {
        HostingKind::Github => {
            let github = config.github()?;
            Ok(Box::new(GitHubHosting::new(github, config.call_timeout())?))
        }
        HostingKind::StaticDir => Ok(Box::new(StaticDirHosting::new(
            config.static_dir()?.root.clone(),
        ))),
        HostingKind::S3 => build_s3_hosting(config).await,
    }
}

#[cfg(feature = "lambda")]
async fn build_s3_hosting(config: &ReaperConfig) -> Result<Box<dyn HostingProvider>> {
    let s3 = config.s3()?;
    let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .region(Region::new(s3.region.clone()))
        .force_path_style(true)
        .build();

    Ok(Box::new(S3Hosting::new(
        S3Client::from_conf(s3_config),
        s3.bucket.clone(),
        s3.prefix.clone(),
    )))
}

#[cfg(not(feature = "lambda"))]
async fn build_s3_hosting(_config: &ReaperConfig) -> Result<Box<dyn HostingProvider>> {
    Err(crate::utils::error::ReaperError::ConfigError {
        message: "hosting.provider = \"s3\" requires building with the `lambda` feature"
            .to_string(),
    })
}

pub async fn build_reaper(config: &ReaperConfig) -> Result<ConfiguredReaper> {
    let store = SupabaseStore::new(&config.store, config.call_timeout())?;
    let hosting = build_hosting(config).await?;
    Ok(Reaper::with_options(store, hosting, config.reaper_options()))
}

/// Validates the configuration and performs a single reaper run against the current time.
pub async fn run_once(config: &ReaperConfig) -> Result<RunSummary> {
    config.validate()?;
    let reaper = build_reaper(config).await?;
    reaper.run(Utc::now()).await
}
