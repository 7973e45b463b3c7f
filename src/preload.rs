//! Prioritized logo preloading.
//!
//! After a render cycle the client hands the fetched dataset to the
//! scheduler, which warms logo caches without ever competing with
//! interactive work. Logos for the selected league load immediately at high
//! priority; everything else is batched through idle slices with a minimum
//! time-budget check, the sole throttle protecting responsiveness.
//!
//! The actual image request goes out through the page and is intercepted by
//! the cache agent like any other fetch; an individual load failure is
//! non-fatal and never retried.

use crate::config::PreloadConfig;
use crate::types::League;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Load priority hint passed to the host's image-loading primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPriority {
    /// Selected-league logos, issued immediately.
    High,
    /// Everything else, issued from idle slices.
    Low,
}

/// Issues an image load request through the host.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Start loading an image. Failures are the host's concern; the
    /// scheduler never observes or retries them.
    async fn load(&self, url: &str, priority: LoadPriority);
}

/// Evidence of already-completed loads, backed by the host's
/// resource-timing records.
pub trait ResourceTiming: Send + Sync {
    /// Whether the resource shows up as already fetched this session.
    fn already_loaded(&self, url: &str) -> bool;
}

/// A bounded span of idle main-loop time offered by the host.
#[derive(Debug, Clone, Copy)]
pub struct IdleSlice {
    /// Time budget remaining in this slice.
    pub remaining: Duration,
}

impl IdleSlice {
    /// Create a slice with the given remaining budget.
    pub fn with_budget(remaining: Duration) -> Self {
        Self { remaining }
    }
}

/// Yields idle time slices from the host's cooperative loop.
#[async_trait]
pub trait IdleScheduler: Send + Sync {
    /// Suspend until the host grants an idle slice.
    async fn request_slice(&self) -> IdleSlice;
}

/// Timer-based substitute for hosts without a native idle-time facility:
/// waits a fixed short delay and reports a full synthetic budget.
pub struct TimerIdle {
    delay: Duration,
    budget: Duration,
}

impl TimerIdle {
    /// Create a timer fallback with the given inter-batch delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            budget: Duration::from_millis(50),
        }
    }

    /// Create the fallback from preload settings.
    pub fn from_config(config: &PreloadConfig) -> Self {
        Self::new(config.idle_fallback_delay)
    }
}

#[async_trait]
impl IdleScheduler for TimerIdle {
    async fn request_slice(&self) -> IdleSlice {
        tokio::time::sleep(self.delay).await;
        IdleSlice::with_budget(self.budget)
    }
}

/// The two disjoint, deduplicated sets of logo identifiers produced by
/// classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoQueue {
    /// Logos of the currently selected league.
    pub priority: Vec<String>,
    /// Logos of every other league.
    pub deferred: Vec<String>,
}

impl LogoQueue {
    /// Classify every match's logo references by league.
    ///
    /// Empty identifiers and the `"null"` sentinel the upstream dataset
    /// sometimes carries are skipped. A logo referenced by both the selected
    /// league and another one lands in the priority set only.
    pub fn classify(leagues: &[League], selected_league: &str) -> Self {
        let mut priority = Vec::new();
        let mut seen = HashSet::new();

        for league in leagues.iter().filter(|l| l.name == selected_league) {
            for logo in Self::logo_refs(league) {
                if seen.insert(logo.to_string()) {
                    priority.push(logo.to_string());
                }
            }
        }

        let mut deferred = Vec::new();
        for league in leagues.iter().filter(|l| l.name != selected_league) {
            for logo in Self::logo_refs(league) {
                if seen.insert(logo.to_string()) {
                    deferred.push(logo.to_string());
                }
            }
        }

        Self { priority, deferred }
    }

    fn logo_refs(league: &League) -> impl Iterator<Item = &str> {
        league
            .matches
            .iter()
            .flat_map(|m| [m.home_logo.as_deref(), m.away_logo.as_deref()])
            .flatten()
            .filter(|logo| !logo.is_empty() && *logo != "null")
    }

    /// Total unique identifiers across both sets.
    pub fn len(&self) -> usize {
        self.priority.len() + self.deferred.len()
    }

    /// Whether both sets are empty.
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.deferred.is_empty()
    }
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Waiting for the next idle slice.
    Idle,
    /// A batch is being issued.
    BatchDispatched,
    /// The deferred cursor reached the end.
    Done,
}

/// Scheduler counters.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// High-priority loads issued.
    pub priority_loaded: u64,
    /// Low-priority loads issued.
    pub deferred_loaded: u64,
    /// Deferred batches dispatched.
    pub batches: u64,
    /// Idle slices skipped for insufficient budget.
    pub skipped_slices: u64,
}

/// Warms logo caches from idle time.
pub struct PreloadScheduler {
    config: PreloadConfig,
    loader: Arc<dyn ImageLoader>,
    timing: Arc<dyn ResourceTiming>,
    idle: Arc<dyn IdleScheduler>,
    phase: RwLock<SchedulerPhase>,
    priority_loaded: AtomicU64,
    deferred_loaded: AtomicU64,
    batches: AtomicU64,
    skipped_slices: AtomicU64,
}

impl PreloadScheduler {
    /// Create a scheduler over the host's primitives.
    pub fn new(
        config: PreloadConfig,
        loader: Arc<dyn ImageLoader>,
        timing: Arc<dyn ResourceTiming>,
        idle: Arc<dyn IdleScheduler>,
    ) -> Self {
        Self {
            config,
            loader,
            timing,
            idle,
            phase: RwLock::new(SchedulerPhase::Idle),
            priority_loaded: AtomicU64::new(0),
            deferred_loaded: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            skipped_slices: AtomicU64::new(0),
        }
    }

    /// Run one preload cycle to completion.
    ///
    /// The priority set loads immediately; the deferred set is partitioned
    /// into `batch_size` batches, each dispatched from its own idle slice.
    /// The loop stops requesting slices once the cursor reaches the end.
    pub async fn run(&self, queue: &LogoQueue) {
        if queue.is_empty() {
            *self.phase.write().await = SchedulerPhase::Done;
            return;
        }
        *self.phase.write().await = SchedulerPhase::Idle;

        // Immediate phase: not idle-gated, skips logos already evidenced
        // as loaded
        for url in &queue.priority {
            if self.timing.already_loaded(url) {
                debug!(url = %url, "Logo already loaded, skipping preload");
                continue;
            }
            self.loader.load(url, LoadPriority::High).await;
            self.priority_loaded.fetch_add(1, Ordering::Relaxed);
        }

        if queue.deferred.is_empty() {
            *self.phase.write().await = SchedulerPhase::Done;
            return;
        }

        let mut cursor = 0;
        while cursor < queue.deferred.len() {
            let slice = self.idle.request_slice().await;

            if slice.remaining < self.config.min_idle_budget {
                // Too little budget to do work; same batch next slice
                self.skipped_slices.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            *self.phase.write().await = SchedulerPhase::BatchDispatched;

            let end = (cursor + self.config.batch_size).min(queue.deferred.len());
            for url in &queue.deferred[cursor..end] {
                self.loader.load(url, LoadPriority::Low).await;
                self.deferred_loaded.fetch_add(1, Ordering::Relaxed);
            }
            self.batches.fetch_add(1, Ordering::Relaxed);
            cursor = end;

            *self.phase.write().await = if cursor < queue.deferred.len() {
                SchedulerPhase::Idle
            } else {
                SchedulerPhase::Done
            };
        }

        debug!(
            priority = self.priority_loaded.load(Ordering::Relaxed),
            deferred = self.deferred_loaded.load(Ordering::Relaxed),
            batches = self.batches.load(Ordering::Relaxed),
            "Preload cycle complete"
        );
    }

    /// Current phase.
    pub async fn phase(&self) -> SchedulerPhase {
        *self.phase.read().await
    }

    /// Counters for the current session.
    pub fn stats(&self) -> PreloadStats {
        PreloadStats {
            priority_loaded: self.priority_loaded.load(Ordering::Relaxed),
            deferred_loaded: self.deferred_loaded.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            skipped_slices: self.skipped_slices.load(Ordering::Relaxed),
        }
    }
}
