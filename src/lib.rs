//! Dugout - offline-first caching and delivery for a sports-prediction client.
//!
//! Dugout is the client-resident layer between a prediction app and the
//! network: a background cache agent that answers every outbound request
//! from a durable local cache or the network according to per-route
//! strategies, plus a prioritized preload scheduler that warms team-logo
//! caches from idle time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client App                          │
//! │        issues requests · renders · selects a league         │
//! └───────────────┬────────────────────────────┬────────────────┘
//!                 │ every fetch                │ dataset
//!                 ▼                            ▼
//! ┌───────────────────────────────┐  ┌─────────────────────────┐
//! │          CacheAgent           │  │    PreloadScheduler     │
//! │  generation lifecycle         │◄─┤  priority classification│
//! │  route table, 5 strategies    │  │  idle-sliced batches    │
//! │  stale-data broadcast         │  └─────────────────────────┘
//! └───────────────┬───────────────┘
//!                 ▼
//! ┌───────────────────────────────┐
//! │   CacheBackend (host store)   │
//! │   static-<gen> · dynamic-<gen>│
//! └───────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use dugout::agent::CacheAgent;
//! use dugout::config::AgentConfig;
//! use dugout::net::HttpFetch;
//! use dugout::store::MemoryBackend;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dugout::Result<()> {
//!     let config = AgentConfig::default();
//!     let fetcher = Arc::new(HttpFetch::new(&config.network)?);
//!     let backend = Arc::new(MemoryBackend::default());
//!
//!     let agent = CacheAgent::install(config, backend, fetcher).await?;
//!     agent.activate().await?;
//!
//!     let response = agent
//!         .handle_fetch(&dugout::types::FetchRequest::get(
//!             "/api/predictions?key=Mistral-Large",
//!         ))
//!         .await?;
//!     println!("{} bytes", response.body.len());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod manifest;
pub mod net;
pub mod preload;
pub mod routes;
pub mod store;
pub mod types;

// Re-exports
pub use agent::{AgentState, CacheAgent};
pub use config::AgentConfig;
pub use error::{DugoutError, Result};
pub use generation::{Generation, StoreNames};
pub use preload::{LogoQueue, PreloadScheduler};
pub use store::{CacheBackend, MemoryBackend};
