use crate::config::ReaperConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "portfolio-reaper")]
#[command(about = "Deletes expired portfolios, their analytics and their hosted artifacts")]
pub struct CliArgs {
    /// Path to a TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// List what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Override reaper.concurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// 載入配置並套用命令列覆蓋設定
    pub fn load_config(&self) -> Result<ReaperConfig> {
        let mut config = match &self.config {
            Some(path) => ReaperConfig::from_file(path)?,
            None => ReaperConfig::from_env()?,
        };

        if self.dry_run {
            config.reaper.dry_run = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.reaper.concurrency = concurrency;
        }

        Ok(config)
    }
}
