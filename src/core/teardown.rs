use crate::domain::model::{TeardownFailure, TeardownOutcome, TeardownStep};
use crate::domain::ports::{HostingProvider, PortfolioStore};
use crate::utils::error::{ReaperError, Result};
use std::future::Future;
use std::time::Duration;

/// Removes the hosted artifact, the portfolio record and its analytics for one key.
///
/// Steps run in that order and the first failure stops the rest, so a record
/// is never dropped while its artifact is still published. The failure is
/// returned as a value; nothing here panics or propagates to the batch.
pub struct Teardown<'a, S: PortfolioStore, H: HostingProvider> {
    store: &'a S,
    hosting: &'a H,
    call_timeout: Duration,
}

impl<'a, S: PortfolioStore, H: HostingProvider> Teardown<'a, S, H> {
    pub fn new(store: &'a S, hosting: &'a H, call_timeout: Duration) -> Self {
        Self {
            store,
            hosting,
            call_timeout,
        }
    }

    pub async fn run(&self, key: &str) -> TeardownOutcome {
        tracing::debug!(key, hosting = self.hosting.name(), "Starting teardown");

        self.step(key, TeardownStep::DeleteArtifact, self.hosting.delete_artifact(key))
            .await?;
        self.step(key, TeardownStep::DeleteRecord, self.store.delete_record(key))
            .await?;
        self.step(key, TeardownStep::DeleteAnalytics, self.store.delete_analytics(key))
            .await?;

        tracing::info!(key, "Deleted {}", key);
        Ok(key.to_string())
    }

    async fn step<F>(
        &self,
        key: &str,
        step: TeardownStep,
        call: F,
    ) -> std::result::Result<(), TeardownFailure>
    where
        F: Future<Output = Result<()>>,
    {
        match bounded(step.as_str(), self.call_timeout, call).await {
            Ok(()) => {
                tracing::debug!(key, step = %step, "Step completed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    key,
                    step = %step,
                    category = ?e.category(),
                    transient = e.is_transient(),
                    "Error deleting {}: {}",
                    key,
                    e
                );
                Err(TeardownFailure::from_error(key, step, &e))
            }
        }
    }
}

/// 為外部呼叫加上逾時，逾時視為該步驟失敗
pub async fn bounded<T, F>(operation: &str, after: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(ReaperError::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}
