use crate::core::expiry::select_expired;
use crate::domain::model::PortfolioRecord;
use crate::domain::ports::PortfolioStore;
use crate::utils::error::{ReaperError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    portfolios: Vec<PortfolioRecord>,
    analytics: HashMap<String, usize>,
    delete_calls: usize,
    list_error: Option<String>,
    delete_error: Option<String>,
}

/// In-process portfolio/analytics tables.
///
/// Clones share the same tables, so a test can hand one clone to the reaper
/// and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Duplicate keys are kept, mirroring a table without a unique index.
    pub fn insert_portfolio(&self, key: &str, expires_at: DateTime<Utc>) {
        self.tables()
            .portfolios
            .push(PortfolioRecord::new(key, expires_at));
    }

    pub fn insert_analytics(&self, key: &str, rows: usize) {
        *self.tables().analytics.entry(key.to_string()).or_default() += rows;
    }

    pub fn has_portfolio(&self, key: &str) -> bool {
        self.tables().portfolios.iter().any(|r| r.key == key)
    }

    pub fn analytics_count(&self, key: &str) -> usize {
        self.tables().analytics.get(key).copied().unwrap_or(0)
    }

    pub fn portfolio_count(&self) -> usize {
        self.tables().portfolios.len()
    }

    pub fn delete_call_count(&self) -> usize {
        self.tables().delete_calls
    }

    /// Makes every following `list_expired` fail as if the store were unreachable.
    pub fn fail_listing_with(&self, message: &str) {
        self.tables().list_error = Some(message.to_string());
    }

    pub fn fail_deletes_with(&self, message: &str) {
        self.tables().delete_error = Some(message.to_string());
    }

    pub fn recover(&self) {
        let mut tables = self.tables();
        tables.list_error = None;
        tables.delete_error = None;
    }

    fn check_delete(tables: &mut Tables) -> Result<()> {
        tables.delete_calls += 1;
        match &tables.delete_error {
            Some(message) => Err(ReaperError::StoreUnavailable {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<PortfolioRecord>> {
        let tables = self.tables();
        if let Some(message) = &tables.list_error {
            return Err(ReaperError::StoreUnavailable {
                message: message.clone(),
            });
        }
        Ok(select_expired(&tables.portfolios, now))
    }

    async fn delete_record(&self, key: &str) -> Result<()> {
        let mut tables = self.tables();
        Self::check_delete(&mut tables)?;
        tables.portfolios.retain(|r| r.key != key);
        Ok(())
    }

    async fn delete_analytics(&self, key: &str) -> Result<()> {
        let mut tables = self.tables();
        Self::check_delete(&mut tables)?;
        tables.analytics.remove(key);
        Ok(())
    }
}
