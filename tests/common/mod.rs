//! Common test utilities for integration tests.

use async_trait::async_trait;
use dugout::config::AgentConfig;
use dugout::error::{DugoutError, Result};
use dugout::manifest::AssetManifest;
use dugout::net::Fetch;
use dugout::preload::{IdleScheduler, IdleSlice, ImageLoader, LoadPriority, ResourceTiming};
use dugout::types::{FetchRequest, League, MatchPrediction, StoredResponse};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted network fake: a fixed URL→response map, an offline switch, and
/// per-URL fetch counters.
pub struct ScriptedFetch {
    responses: Mutex<HashMap<String, StoredResponse>>,
    offline: AtomicBool,
    counts: Mutex<HashMap<String, u64>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// A fake already serving the shell assets and a version descriptor.
    pub fn with_shell(version: &str) -> Self {
        let fetch = Self::new();
        fetch.serve(
            "/version.json",
            StoredResponse::ok(format!(r#"{{"version":"{}"}}"#, version).into_bytes()),
        );
        fetch.serve("/index.html", StoredResponse::ok(b"<html>shell</html>".to_vec()));
        fetch.serve("/manifest.json", StoredResponse::ok(b"{}".to_vec()));
        fetch
    }

    pub fn serve(&self, url: &str, response: StoredResponse) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn fetch_count(&self, url: &str) -> u64 {
        *self.counts.lock().unwrap().get(url).unwrap_or(&0)
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, request: &FetchRequest) -> Result<StoredResponse> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DugoutError::Network("offline".to_string()));
        }
        *self
            .counts
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_insert(0) += 1;
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .get(&request.url)
            .cloned()
            .unwrap_or_else(StoredResponse::not_found))
    }
}

/// Image-loader fake recording every issued load.
#[derive(Default)]
pub struct RecordingLoader {
    loads: Mutex<Vec<(String, LoadPriority)>>,
}

impl RecordingLoader {
    pub fn loads(&self) -> Vec<(String, LoadPriority)> {
        self.loads.lock().unwrap().clone()
    }

    pub fn load_count(&self, url: &str) -> usize {
        self.loads
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }
}

#[async_trait]
impl ImageLoader for RecordingLoader {
    async fn load(&self, url: &str, priority: LoadPriority) {
        self.loads.lock().unwrap().push((url.to_string(), priority));
    }
}

/// Resource-timing fake with a fixed set of already-loaded URLs.
pub struct FixedTiming(pub HashSet<String>);

impl FixedTiming {
    pub fn empty() -> Self {
        Self(HashSet::new())
    }
}

impl ResourceTiming for FixedTiming {
    fn already_loaded(&self, url: &str) -> bool {
        self.0.contains(url)
    }
}

/// Idle fake granting scripted budgets, then a generous default, and
/// counting granted slices.
pub struct ScriptedIdle {
    budgets: Mutex<VecDeque<Duration>>,
    granted: AtomicU64,
}

impl ScriptedIdle {
    pub fn generous() -> Self {
        Self::with_budgets(&[])
    }

    pub fn with_budgets(budgets: &[Duration]) -> Self {
        Self {
            budgets: Mutex::new(budgets.iter().copied().collect()),
            granted: AtomicU64::new(0),
        }
    }

    pub fn slices_granted(&self) -> u64 {
        self.granted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IdleScheduler for ScriptedIdle {
    async fn request_slice(&self) -> IdleSlice {
        self.granted.fetch_add(1, Ordering::Relaxed);
        let budget = self
            .budgets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Duration::from_millis(50));
        IdleSlice::with_budget(budget)
    }
}

/// Install a test subscriber so `RUST_LOG=debug cargo test` shows agent logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Agent configuration with a small, fully scripted manifest.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        manifest: AssetManifest::new()
            .with_path("/index.html")
            .with_path("/manifest.json")
            .with_prefix("/images/"),
        ..Default::default()
    }
}

/// Build a league fixture from (home_logo, away_logo) pairs.
pub fn league(name: &str, logos: &[(&str, &str)]) -> League {
    League {
        name: name.to_string(),
        timestamp: "2025-01-24 06:00".to_string(),
        matches: logos
            .iter()
            .map(|(home, away)| MatchPrediction {
                home_team: format!("{} FC", home),
                away_team: format!("{} FC", away),
                home_logo: (!home.is_empty()).then(|| home.to_string()),
                away_logo: (!away.is_empty()).then(|| away.to_string()),
                commence_time_str: "25.01.2025 15:30".to_string(),
                outlook: "Close match".to_string(),
                prediction_home: 1,
                prediction_away: 1,
                reasoning: None,
            })
            .collect(),
    }
}
