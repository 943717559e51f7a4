use crate::domain::ports::HostingProvider;
use crate::utils::error::{ReaperError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Scripted {
    Deny,
    RateLimit,
}

#[derive(Default)]
struct State {
    artifacts: HashSet<String>,
    scripted: HashMap<String, Scripted>,
    calls: Vec<String>,
    delay: Option<Duration>,
}

/// Hosting double with per-key scripted failures.
#[derive(Clone, Default)]
pub struct ScriptedHosting {
    state: Arc<Mutex<State>>,
}

impl ScriptedHosting {
    pub fn with_artifacts(keys: &[&str]) -> Self {
        let hosting = Self::default();
        hosting
            .state
            .lock()
            .unwrap()
            .artifacts
            .extend(keys.iter().map(|k| k.to_string()));
        hosting
    }

    pub fn deny(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(key.to_string(), Scripted::Deny);
    }

    pub fn rate_limit(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(key.to_string(), Scripted::RateLimit);
    }

    pub fn delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn has_artifact(&self, key: &str) -> bool {
        self.state.lock().unwrap().artifacts.contains(key)
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl HostingProvider for ScriptedHosting {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.calls.push(key.to_string());
        match state.scripted.get(key).copied() {
            Some(Scripted::Deny) => Err(ReaperError::HostingNotAuthorized {
                key: key.to_string(),
                message: "Must have admin rights to Repository.".to_string(),
            }),
            Some(Scripted::RateLimit) => Err(ReaperError::HostingRateLimited {
                key: key.to_string(),
                retry_after: Some(Duration::from_secs(60)),
            }),
            None => {
                state.artifacts.remove(key);
                Ok(())
            }
        }
    }
}
