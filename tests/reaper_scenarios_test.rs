use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use portfolio_reaper::domain::model::{FailureKind, TeardownStep};
use portfolio_reaper::{
    HostingProvider, MemoryStore, PortfolioStore, Reaper, ReaperError, ReaperOptions, Result,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Hosting double: a set of live artifacts plus keys that answer "not authorized".
#[derive(Clone, Default)]
struct FakePages {
    live: Arc<Mutex<HashSet<String>>>,
    denied: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakePages {
    fn publish(&self, key: &str) {
        self.live.lock().unwrap().insert(key.to_string());
    }

    fn deny(&self, key: &str) {
        self.denied.lock().unwrap().insert(key.to_string());
    }

    fn is_live(&self, key: &str) -> bool {
        self.live.lock().unwrap().contains(key)
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostingProvider for FakePages {
    fn name(&self) -> &str {
        "fake-pages"
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(key.to_string());
        if self.denied.lock().unwrap().contains(key) {
            return Err(ReaperError::HostingNotAuthorized {
                key: key.to_string(),
                message: "Bad credentials".to_string(),
            });
        }
        self.live.lock().unwrap().remove(key);
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0).unwrap()
}

fn seed(store: &MemoryStore, pages: &FakePages, key: &str, expires_at: DateTime<Utc>) {
    store.insert_portfolio(key, expires_at);
    store.insert_analytics(key, 5);
    pages.publish(key);
}

#[tokio::test]
async fn test_scenario_expired_alice_live_bob() {
    let store = MemoryStore::new();
    let pages = FakePages::default();
    seed(&store, &pages, "alice-portfolio", now() - Duration::days(1));
    seed(&store, &pages, "bob-portfolio", now() + Duration::days(1));

    let summary = Reaper::new(store.clone(), pages.clone())
        .run(now())
        .await
        .unwrap();

    assert_eq!(summary.succeeded, vec!["alice-portfolio".to_string()]);
    assert!(summary.failures.is_empty());
    assert!(!pages.is_live("alice-portfolio"));
    assert!(!store.has_portfolio("alice-portfolio"));
    assert_eq!(store.analytics_count("alice-portfolio"), 0);

    assert!(pages.is_live("bob-portfolio"));
    assert!(store.has_portfolio("bob-portfolio"));
    assert_eq!(store.analytics_count("bob-portfolio"), 5);
}

#[tokio::test]
async fn test_scenario_carol_not_authorized() {
    let store = MemoryStore::new();
    let pages = FakePages::default();
    seed(&store, &pages, "carol-portfolio", now() - Duration::hours(1));
    pages.deny("carol-portfolio");

    let summary = Reaper::new(store.clone(), pages.clone())
        .run(now())
        .await
        .unwrap();

    assert_eq!(summary.failure_count(), 1);
    let failure = &summary.failures[0];
    assert_eq!(failure.key, "carol-portfolio");
    assert_eq!(failure.step, TeardownStep::DeleteArtifact);
    assert_eq!(failure.kind, FailureKind::NotAuthorized);
    assert!(failure.message.contains("Bad credentials"));

    assert!(store.has_portfolio("carol-portfolio"));
    assert_eq!(store.analytics_count("carol-portfolio"), 5);
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_scenario_nothing_expired() {
    let store = MemoryStore::new();
    let pages = FakePages::default();

    let summary = Reaper::new(store.clone(), pages.clone())
        .run(now())
        .await
        .unwrap();

    assert_eq!(summary.listed, 0);
    assert!(summary.succeeded.is_empty());
    assert!(summary.failures.is_empty());
    assert!(pages.calls().is_empty());
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_scenario_artifact_deleted_out_of_band() {
    let store = MemoryStore::new();
    let pages = FakePages::default();
    seed(&store, &pages, "erin-portfolio", now() - Duration::days(3));
    store.insert_portfolio("gina-portfolio", now() - Duration::days(2));
    store.insert_analytics("gina-portfolio", 1);

    let summary = Reaper::new(store.clone(), pages.clone())
        .run(now())
        .await
        .unwrap();

    assert!(summary.is_clean());
    assert_eq!(summary.success_count(), 2);
    assert!(pages.calls().contains(&"gina-portfolio".to_string()));
    assert!(!store.has_portfolio("gina-portfolio"));
    assert_eq!(store.analytics_count("gina-portfolio"), 0);
}

#[tokio::test]
async fn test_failed_key_is_retried_on_next_run() {
    let store = MemoryStore::new();
    let pages = FakePages::default();
    seed(&store, &pages, "carol-portfolio", now() - Duration::hours(1));
    seed(&store, &pages, "alice-portfolio", now() - Duration::hours(1));
    pages.deny("carol-portfolio");

    let reaper = Reaper::new(store.clone(), pages.clone());
    let first = reaper.run(now()).await.unwrap();
    assert_eq!(first.success_count(), 1);
    assert_eq!(first.failed_keys(), vec!["carol-portfolio"]);

    let pending = store.list_expired(now()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].key, "carol-portfolio");

    // 權杖修正後，下一次排程執行即完成清理
    pages.denied.lock().unwrap().clear();
    let second = reaper.run(now() + Duration::days(1)).await.unwrap();
    assert_eq!(second.succeeded, vec!["carol-portfolio".to_string()]);
    assert_eq!(store.portfolio_count(), 0);
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential_outcome() {
    let store = MemoryStore::new();
    let pages = FakePages::default();
    for i in 0..20 {
        seed(&store, &pages, &format!("user{i}"), now() - Duration::minutes(i + 1));
    }
    seed(&store, &pages, "late-user", now() + Duration::minutes(1));
    pages.deny("user7");
    pages.deny("user13");

    let options = ReaperOptions {
        concurrency: 8,
        ..ReaperOptions::default()
    };
    let summary = Reaper::with_options(store.clone(), pages.clone(), options)
        .run(now())
        .await
        .unwrap();

    assert_eq!(summary.listed, 20);
    assert_eq!(summary.success_count(), 18);
    let mut failed = summary.failed_keys();
    failed.sort();
    assert_eq!(failed, vec!["user13", "user7"]);
    assert_eq!(store.portfolio_count(), 3);
    assert!(pages.is_live("late-user"));
}
