//! Integration tests for the preload scheduler, including the full
//! preload-through-agent path.

#[allow(dead_code)]
mod common;

use async_trait::async_trait;
use common::{league, test_config, FixedTiming, RecordingLoader, ScriptedFetch, ScriptedIdle};
use dugout::agent::CacheAgent;
use dugout::config::PreloadConfig;
use dugout::preload::{
    ImageLoader, LoadPriority, LogoQueue, PreloadScheduler, SchedulerPhase, TimerIdle,
};
use dugout::store::{CacheBackend, MemoryBackend};
use dugout::types::{FetchRequest, StoredResponse};
use std::sync::Arc;

fn scheduler_with(
    batch_size: usize,
    loader: Arc<dyn ImageLoader>,
    idle: Arc<ScriptedIdle>,
) -> PreloadScheduler {
    PreloadScheduler::new(
        PreloadConfig {
            batch_size,
            ..Default::default()
        },
        loader,
        Arc::new(FixedTiming::empty()),
        idle,
    )
}

#[tokio::test]
async fn test_shared_logo_preloads_exactly_once() {
    // Every Bundesliga match references bayern on one side
    let leagues = vec![
        league(
            "Bundesliga",
            &[("bayern", "dortmund"), ("leipzig", "bayern"), ("bayern", "union")],
        ),
        league("Premier League", &[("arsenal", "chelsea")]),
    ];
    let queue = LogoQueue::classify(&leagues, "Bundesliga");

    let loader = Arc::new(RecordingLoader::default());
    let sched = scheduler_with(10, Arc::clone(&loader) as _, Arc::new(ScriptedIdle::generous()));
    sched.run(&queue).await;

    assert_eq!(loader.load_count("bayern"), 1);
    assert_eq!(loader.load_count("arsenal"), 1);
    assert_eq!(loader.loads().len(), queue.len());
}

#[tokio::test]
async fn test_termination_issues_no_idle_requests_after_last_batch() {
    let deferred: Vec<String> = (0..23).map(|i| format!("logo-{}", i)).collect();
    let queue = LogoQueue {
        priority: vec![],
        deferred,
    };

    let loader = Arc::new(RecordingLoader::default());
    let idle = Arc::new(ScriptedIdle::generous());
    let sched = scheduler_with(10, Arc::clone(&loader) as _, Arc::clone(&idle));
    sched.run(&queue).await;

    // 23 identifiers at batch size 10: ceil gives 3 dispatches and exactly
    // 3 idle requests, none afterward
    assert_eq!(sched.stats().batches, 3);
    assert_eq!(idle.slices_granted(), 3);
    assert_eq!(sched.phase().await, SchedulerPhase::Done);
    assert_eq!(loader.loads().len(), 23);
}

#[tokio::test]
async fn test_timer_fallback_drives_batches_to_completion() {
    let queue = LogoQueue {
        priority: vec![],
        deferred: (0..5).map(|i| format!("logo-{}", i)).collect(),
    };

    // Host without a native idle facility: the timer substitute paces batches
    let config = PreloadConfig {
        batch_size: 2,
        idle_fallback_delay: std::time::Duration::from_millis(1),
        ..Default::default()
    };
    let loader = Arc::new(RecordingLoader::default());
    let sched = PreloadScheduler::new(
        config.clone(),
        Arc::clone(&loader) as _,
        Arc::new(FixedTiming::empty()),
        Arc::new(TimerIdle::from_config(&config)),
    );
    sched.run(&queue).await;

    assert_eq!(sched.stats().batches, 3);
    assert_eq!(loader.loads().len(), 5);
    assert_eq!(sched.phase().await, SchedulerPhase::Done);
}

/// Image loader that routes through a live agent, the way page-issued image
/// requests are intercepted in production.
struct AgentLoader {
    agent: Arc<CacheAgent>,
}

#[async_trait]
impl ImageLoader for AgentLoader {
    async fn load(&self, url: &str, _priority: LoadPriority) {
        // A broken image is the browser's problem, not the scheduler's
        let _ = self.agent.handle_fetch(&FetchRequest::get(url)).await;
    }
}

#[tokio::test]
async fn test_preload_through_agent_warms_logo_cache() {
    common::init_tracing();
    let backend = Arc::new(MemoryBackend::default());
    let fetch = Arc::new(ScriptedFetch::with_shell("v1"));
    for logo in ["bayern", "dortmund", "arsenal", "chelsea"] {
        fetch.serve(
            &format!("/images/team_logos/{}.png", logo),
            StoredResponse::ok(logo.as_bytes().to_vec()),
        );
    }

    let agent = Arc::new(
        CacheAgent::install(test_config(), Arc::clone(&backend) as _, Arc::clone(&fetch) as _)
            .await
            .unwrap(),
    );
    agent.activate().await.unwrap();

    let leagues = vec![
        league(
            "Bundesliga",
            &[("/images/team_logos/bayern.png", "/images/team_logos/dortmund.png")],
        ),
        league(
            "Premier League",
            &[("/images/team_logos/arsenal.png", "/images/team_logos/chelsea.png")],
        ),
    ];
    let queue = LogoQueue::classify(&leagues, "Bundesliga");

    let sched = scheduler_with(
        10,
        Arc::new(AgentLoader {
            agent: Arc::clone(&agent),
        }),
        Arc::new(ScriptedIdle::generous()),
    );
    sched.run(&queue).await;

    // Every logo, priority and deferred alike, now sits in the static store
    for logo in ["bayern", "dortmund", "arsenal", "chelsea"] {
        let cached = backend
            .lookup("static-v1", &format!("/images/team_logos/{}.png", logo))
            .await
            .unwrap();
        assert!(cached.is_some(), "{} should be cached", logo);
    }

    // And a later offline render still gets its logos
    fetch.go_offline();
    let cached = agent
        .handle_fetch(&FetchRequest::get("/images/team_logos/bayern.png"))
        .await
        .unwrap();
    assert_eq!(cached.body, b"bayern");
}
