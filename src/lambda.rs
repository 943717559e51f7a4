#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use portfolio_reaper::app::run_once;
#[cfg(feature = "lambda")]
use portfolio_reaper::utils::logger;
#[cfg(feature = "lambda")]
use portfolio_reaper::ReaperConfig;
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};

/// EventBridge scheduled events carry their own fields; only `dry_run` is read.
#[cfg(feature = "lambda")]
#[derive(Deserialize, Default)]
pub struct Request {
    #[serde(default)]
    pub dry_run: Option<bool>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub listed: usize,
    pub deleted: usize,
    pub failed: usize,
    pub failed_keys: Vec<String>,
    pub dry_run: bool,
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    tracing::info!("Starting portfolio reaper Lambda function");

    let mut config = ReaperConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    if let Some(dry_run) = event.payload.dry_run {
        config.reaper.dry_run = dry_run;
    }

    let summary = run_once(&config).await.map_err(|e| {
        tracing::error!(
            category = ?e.category(),
            "❌ Reaper run aborted: {} ({})",
            e,
            e.recovery_suggestion()
        );
        Box::new(e) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let message = if summary.is_clean() {
        "Reaper run completed".to_string()
    } else {
        format!("Reaper run completed with {} failures", summary.failure_count())
    };

    Ok(Response {
        message,
        listed: summary.listed,
        deleted: summary.success_count(),
        failed: summary.failure_count(),
        failed_keys: summary.failed_keys().into_iter().map(str::to_string).collect(),
        dry_run: summary.dry_run,
    })
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
