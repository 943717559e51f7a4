pub mod expiry;
pub mod reaper;
pub mod teardown;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{PortfolioRecord, RunSummary, TeardownFailure, TeardownOutcome};
pub use crate::domain::ports::{HostingProvider, PortfolioStore};
pub use crate::utils::error::Result;
