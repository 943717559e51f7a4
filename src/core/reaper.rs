use crate::core::expiry::dedup_by_key;
use crate::core::teardown::{bounded, Teardown};
use crate::domain::model::{RunSummary, TeardownOutcome};
use crate::domain::ports::{HostingProvider, PortfolioStore};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ReaperOptions {
    /// Teardowns in flight at once; 1 keeps the run strictly sequential.
    pub concurrency: usize,
    pub call_timeout: Duration,
    pub dry_run: bool,
}

impl Default for ReaperOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            dry_run: false,
        }
    }
}

/// Batch entry point: list expired portfolios, tear each one down, summarize.
pub struct Reaper<S: PortfolioStore, H: HostingProvider> {
    store: S,
    hosting: H,
    options: ReaperOptions,
}

impl<S: PortfolioStore, H: HostingProvider> Reaper<S, H> {
    pub fn new(store: S, hosting: H) -> Self {
        Self::with_options(store, hosting, ReaperOptions::default())
    }

    pub fn with_options(store: S, hosting: H, options: ReaperOptions) -> Self {
        Self {
            store,
            hosting,
            options,
        }
    }

    /// Only a failed listing is returned as `Err`; per-key failures land in the summary.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let mut summary = RunSummary::new(Utc::now(), self.options.dry_run);

        tracing::info!(
            now = %now.to_rfc3339(),
            hosting = self.hosting.name(),
            dry_run = self.options.dry_run,
            "🔍 Querying expired portfolios"
        );
        let listed = bounded(
            "list_expired",
            self.options.call_timeout,
            self.store.list_expired(now),
        )
        .await?;

        let raw_count = listed.len();
        let expired = dedup_by_key(listed);
        if expired.len() != raw_count {
            tracing::debug!(
                duplicates = raw_count - expired.len(),
                "Collapsed duplicate expired keys"
            );
        }
        summary.listed = expired.len();
        tracing::info!("Found {} expired portfolios", expired.len());

        if self.options.dry_run {
            for record in &expired {
                tracing::info!(
                    key = %record.key,
                    expires_at = %record.expires_at.to_rfc3339(),
                    "Would delete {}",
                    record.key
                );
            }
            summary.skipped = expired.into_iter().map(|r| r.key).collect();
        } else if !expired.is_empty() {
            let teardown = Teardown::new(&self.store, &self.hosting, self.options.call_timeout);
            let outcomes: Vec<TeardownOutcome> = stream::iter(expired.iter())
                .map(|record| teardown.run(&record.key))
                .buffer_unordered(self.options.concurrency.max(1))
                .collect()
                .await;

            for outcome in outcomes {
                summary.record(outcome);
            }
        }

        summary.finished_at = Utc::now();
        log_summary(&summary);
        Ok(summary)
    }
}

/// One event per failure plus a single summary event for alerting.
pub fn log_summary(summary: &RunSummary) {
    for failure in &summary.failures {
        tracing::warn!(
            key = %failure.key,
            step = %failure.step,
            kind = ?failure.kind,
            transient = failure.kind.is_transient(),
            reason = %failure.message,
            "Teardown failed"
        );
    }

    let elapsed_ms = summary.elapsed().as_millis() as u64;
    if summary.is_clean() {
        tracing::info!(
            listed = summary.listed,
            succeeded = summary.success_count(),
            skipped = summary.skipped.len(),
            failed = 0,
            elapsed_ms,
            "✅ Reaper run completed"
        );
    } else {
        tracing::warn!(
            listed = summary.listed,
            succeeded = summary.success_count(),
            skipped = summary.skipped.len(),
            failed = summary.failure_count(),
            failed_keys = ?summary.failed_keys(),
            elapsed_ms,
            "❌ Reaper run completed with failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::test_support::ScriptedHosting;
    use crate::domain::model::{FailureKind, TeardownStep};
    use crate::utils::error::ReaperError;
    use chrono::Duration as ChronoDuration;

    fn yesterday(now: DateTime<Utc>) -> DateTime<Utc> {
        now - ChronoDuration::days(1)
    }

    fn tomorrow(now: DateTime<Utc>) -> DateTime<Utc> {
        now + ChronoDuration::days(1)
    }

    #[tokio::test]
    async fn test_expired_torn_down_and_live_untouched() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("alice-portfolio", yesterday(now));
        store.insert_analytics("alice-portfolio", 4);
        store.insert_portfolio("bob-portfolio", tomorrow(now));
        store.insert_analytics("bob-portfolio", 1);
        let hosting = ScriptedHosting::with_artifacts(&["alice-portfolio", "bob-portfolio"]);

        let reaper = Reaper::new(store.clone(), hosting.clone());
        let summary = reaper.run(now).await.unwrap();

        assert_eq!(summary.succeeded, vec!["alice-portfolio"]);
        assert!(summary.is_clean());
        assert!(!hosting.has_artifact("alice-portfolio"));
        assert!(!store.has_portfolio("alice-portfolio"));
        assert_eq!(store.analytics_count("alice-portfolio"), 0);

        assert!(hosting.has_artifact("bob-portfolio"));
        assert!(store.has_portfolio("bob-portfolio"));
        assert_eq!(store.analytics_count("bob-portfolio"), 1);
        assert_eq!(hosting.delete_calls(), vec!["alice-portfolio"]);
    }

    #[tokio::test]
    async fn test_not_authorized_reported_and_records_kept() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("carol-portfolio", yesterday(now));
        store.insert_analytics("carol-portfolio", 2);
        let hosting = ScriptedHosting::with_artifacts(&["carol-portfolio"]);
        hosting.deny("carol-portfolio");

        let summary = Reaper::new(store.clone(), hosting).run(now).await.unwrap();

        assert_eq!(summary.success_count(), 0);
        assert_eq!(summary.failure_count(), 1);
        let failure = &summary.failures[0];
        assert_eq!(failure.key, "carol-portfolio");
        assert_eq!(failure.step, TeardownStep::DeleteArtifact);
        assert_eq!(failure.kind, FailureKind::NotAuthorized);
        assert!(failure.message.contains("Must have admin rights"));
        assert!(store.has_portfolio("carol-portfolio"));
        assert_eq!(store.analytics_count("carol-portfolio"), 2);
        assert_eq!(store.delete_call_count(), 0);
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_nothing_expired() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("bob-portfolio", tomorrow(now));
        let hosting = ScriptedHosting::default();

        let summary = Reaper::new(store.clone(), hosting.clone())
            .run(now)
            .await
            .unwrap();

        assert_eq!(summary.listed, 0);
        assert!(summary.succeeded.is_empty());
        assert!(summary.failures.is_empty());
        assert!(hosting.delete_calls().is_empty());
        assert_eq!(store.delete_call_count(), 0);
        assert_eq!(summary.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_artifact_removed_out_of_band() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("erin-portfolio", yesterday(now));
        store.insert_portfolio("frank-portfolio", yesterday(now));
        store.insert_analytics("frank-portfolio", 1);
        // erin's repository was already deleted by hand
        let hosting = ScriptedHosting::with_artifacts(&["frank-portfolio"]);

        let summary = Reaper::new(store.clone(), hosting).run(now).await.unwrap();

        assert!(summary.is_clean());
        assert_eq!(summary.success_count(), 2);
        assert_eq!(store.portfolio_count(), 0);
        assert_eq!(store.delete_call_count(), 4);
    }

    #[tokio::test]
    async fn test_failure_isolated_and_retried_next_run() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("carol-portfolio", yesterday(now));
        store.insert_portfolio("alice-portfolio", yesterday(now));
        let hosting = ScriptedHosting::with_artifacts(&["carol-portfolio", "alice-portfolio"]);
        hosting.rate_limit("carol-portfolio");

        let reaper = Reaper::new(store.clone(), hosting.clone());
        let first = reaper.run(now).await.unwrap();

        assert_eq!(first.succeeded, vec!["alice-portfolio"]);
        assert_eq!(first.failed_keys(), vec!["carol-portfolio"]);
        assert_eq!(first.exit_code(), 2);

        let still_expired = store.list_expired(now).await.unwrap();
        assert_eq!(still_expired.len(), 1);
        assert_eq!(still_expired[0].key, "carol-portfolio");
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let store = MemoryStore::new();
        store.fail_listing_with("connection refused");
        let hosting = ScriptedHosting::default();

        let err = Reaper::new(store, hosting.clone())
            .run(Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, ReaperError::StoreUnavailable { .. }));
        assert!(hosting.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_keys_torn_down_once() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("alice-portfolio", yesterday(now));
        store.insert_portfolio("alice-portfolio", yesterday(now));
        let hosting = ScriptedHosting::with_artifacts(&["alice-portfolio"]);

        let summary = Reaper::new(store.clone(), hosting.clone())
            .run(now)
            .await
            .unwrap();

        assert_eq!(summary.listed, 1);
        assert_eq!(summary.succeeded, vec!["alice-portfolio"]);
        assert_eq!(hosting.delete_calls(), vec!["alice-portfolio"]);
        assert!(!store.has_portfolio("alice-portfolio"));
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_deletes() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_portfolio("alice-portfolio", yesterday(now));
        let hosting = ScriptedHosting::with_artifacts(&["alice-portfolio"]);
        let options = ReaperOptions {
            dry_run: true,
            ..ReaperOptions::default()
        };

        let summary = Reaper::with_options(store.clone(), hosting.clone(), options)
            .run(now)
            .await
            .unwrap();

        assert_eq!(summary.skipped, vec!["alice-portfolio"]);
        assert!(summary.succeeded.is_empty());
        assert!(hosting.delete_calls().is_empty());
        assert!(store.has_portfolio("alice-portfolio"));
    }

    #[tokio::test]
    async fn test_bounded_concurrency_processes_all() {
        let now = Utc::now();
        let store = MemoryStore::new();
        let keys: Vec<String> = (0..10).map(|i| format!("user{i}-portfolio")).collect();
        for key in &keys {
            store.insert_portfolio(key, yesterday(now));
        }
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let hosting = ScriptedHosting::with_artifacts(&key_refs);
        hosting.deny("user3-portfolio");
        let options = ReaperOptions {
            concurrency: 4,
            ..ReaperOptions::default()
        };

        let summary = Reaper::with_options(store.clone(), hosting, options)
            .run(now)
            .await
            .unwrap();

        assert_eq!(summary.success_count(), 9);
        assert_eq!(summary.failed_keys(), vec!["user3-portfolio"]);
        assert_eq!(store.portfolio_count(), 1);
    }
}
