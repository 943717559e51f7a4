pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

#[cfg(feature = "lambda")]
pub use adapters::S3Hosting;

pub use adapters::{GitHubHosting, MemoryStore, StaticDirHosting, SupabaseStore};
pub use config::ReaperConfig;
pub use core::reaper::{Reaper, ReaperOptions};
pub use domain::model::{PortfolioRecord, RunSummary, TeardownFailure};
pub use domain::ports::{HostingProvider, PortfolioStore};
pub use utils::error::{ReaperError, Result};
