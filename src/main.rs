use clap::Parser;
use portfolio_reaper::app::run_once;
use portfolio_reaper::utils::logger;
use portfolio_reaper::CliArgs;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting portfolio-reaper");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    match run_once(&config).await {
        Ok(summary) => {
            println!(
                "{} expired, {} deleted, {} failed{}",
                summary.listed,
                summary.success_count(),
                summary.failure_count(),
                if summary.dry_run { " (dry run)" } else { "" }
            );
            for failure in &summary.failures {
                eprintln!("❌ {} [{}] {}", failure.key, failure.step, failure.message);
            }
            std::process::exit(summary.exit_code());
        }
        Err(e) => {
            // 列表階段失敗：整次執行中止
            tracing::error!(
                "❌ Reaper run aborted: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}
