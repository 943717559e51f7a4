use crate::domain::model::PortfolioRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Strictly earlier than `now`; a record expiring exactly at `now` survives.
pub fn is_expired(record: &PortfolioRecord, now: DateTime<Utc>) -> bool {
    record.expires_at < now
}

pub fn select_expired<'a, I>(records: I, now: DateTime<Utc>) -> Vec<PortfolioRecord>
where
    I: IntoIterator<Item = &'a PortfolioRecord>,
{
    records
        .into_iter()
        .filter(|r| is_expired(r, now))
        .cloned()
        .collect()
}

/// Collapses repeated keys, keeping the first occurrence.
pub fn dedup_by_key(records: Vec<PortfolioRecord>) -> Vec<PortfolioRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.key.clone()))
        .collect()
}
