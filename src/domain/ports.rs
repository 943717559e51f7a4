use crate::domain::model::PortfolioRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Backing database holding portfolio and analytics rows.
///
/// Deletes must succeed when nothing matches the key.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<PortfolioRecord>>;
    async fn delete_record(&self, key: &str) -> Result<()>;
    async fn delete_analytics(&self, key: &str) -> Result<()>;
}

/// Wherever the rendered portfolio lives (git pages, blob bucket, static dir).
///
/// An artifact that is already gone is a successful delete.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn delete_artifact(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: PortfolioStore + ?Sized> PortfolioStore for Arc<T> {
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<PortfolioRecord>> {
        (**self).list_expired(now).await
    }

    async fn delete_record(&self, key: &str) -> Result<()> {
        (**self).delete_record(key).await
    }

    async fn delete_analytics(&self, key: &str) -> Result<()> {
        (**self).delete_analytics(key).await
    }
}

#[async_trait]
impl<T: HostingProvider + ?Sized> HostingProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        (**self).delete_artifact(key).await
    }
}

#[async_trait]
impl<T: HostingProvider + ?Sized> HostingProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        (**self).delete_artifact(key).await
    }
}
