//! Cache generations and store naming.
//!
//! A generation is the opaque version identifier that controls which pair of
//! cache stores is current. It is minted once at agent install time from the
//! version descriptor; if the descriptor is unreachable the agent falls back
//! to a pinned identifier rather than failing the install.

use crate::config::AgentConfig;
use crate::error::{DugoutError, Result};
use crate::net::Fetch;
use crate::types::{FetchRequest, VersionDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// An opaque cache-generation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generation(String);

impl Generation {
    /// Create a generation from a raw version string.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Mint a generation from a version descriptor.
    pub fn from_descriptor(descriptor: &VersionDescriptor) -> Self {
        Self(descriptor.version.clone())
    }

    /// The raw version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pair of store names derived from a generation.
///
/// These two names are the only live stores while the generation is current;
/// activation deletes every other name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    /// Precached shell assets.
    pub static_store: String,
    /// Runtime API responses.
    pub dynamic_store: String,
}

impl StoreNames {
    /// Derive the store names for a generation.
    pub fn for_generation(generation: &Generation) -> Self {
        Self {
            static_store: format!("static-{}", generation),
            dynamic_store: format!("dynamic-{}", generation),
        }
    }

    /// The keep-list used during activation: exactly these names survive.
    pub fn keep_list(&self) -> [&str; 2] {
        [&self.static_store, &self.dynamic_store]
    }

    /// Whether a store name belongs to this generation.
    pub fn contains(&self, name: &str) -> bool {
        name == self.static_store || name == self.dynamic_store
    }
}

/// Resolve the current generation by fetching the version descriptor.
///
/// Any failure (transport, non-200, malformed body) degrades to the
/// configured fallback version; install never aborts here.
pub async fn resolve(fetcher: &dyn Fetch, config: &AgentConfig) -> Generation {
    match fetch_descriptor(fetcher, &config.version_path).await {
        Ok(descriptor) => {
            debug!(version = %descriptor.version, "Resolved cache generation");
            Generation::from_descriptor(&descriptor)
        }
        Err(e) => {
            warn!(error = %e, fallback = %config.fallback_version,
                "Version descriptor unreachable, using fallback generation");
            Generation::new(config.fallback_version.clone())
        }
    }
}

async fn fetch_descriptor(fetcher: &dyn Fetch, version_path: &str) -> Result<VersionDescriptor> {
    let request = FetchRequest::get(version_path);
    let response = fetcher
        .fetch(&request)
        .await
        .map_err(|e| DugoutError::VersionResolution(e.to_string()))?;

    if !response.is_success() {
        return Err(DugoutError::VersionResolution(format!(
            "HTTP {} from {}",
            response.status, version_path
        )));
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| DugoutError::VersionParse(e.to_string()))
}
