//! Configuration for the dugout caching layer.
//!
//! The configuration is constructed once when the hosting runtime installs
//! the agent and is threaded into every handler from there; no handler reads
//! mutable module state.

use crate::error::{DugoutError, Result};
use crate::manifest::AssetManifest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Version identifier used when the version descriptor cannot be fetched
/// during install.
pub const FALLBACK_VERSION: &str = "0000000000";

/// Top-level configuration for a cache agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Path prefix of the prediction API.
    pub api_prefix: String,
    /// Exact path of the version descriptor.
    pub version_path: String,
    /// Path prefix of team logo images.
    pub logo_prefix: String,
    /// Path of the application shell document served to offline navigations.
    pub shell_path: String,
    /// Version used when the descriptor is unreachable at install time.
    pub fallback_version: String,
    /// Patterns that qualify for the static store.
    pub manifest: AssetManifest,
    /// Network settings.
    pub network: NetworkConfig,
    /// Preload scheduler settings.
    pub preload: PreloadConfig,
    /// Buffered capacity of the page broadcast channel.
    pub page_buffer: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/predictions".to_string(),
            version_path: "/version.json".to_string(),
            logo_prefix: "/images/team_logos/".to_string(),
            shell_path: "/index.html".to_string(),
            fallback_version: FALLBACK_VERSION.to_string(),
            manifest: AssetManifest::app_shell(),
            network: NetworkConfig::default(),
            preload: PreloadConfig::default(),
            page_buffer: 64,
        }
    }
}

impl AgentConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DugoutError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DugoutError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("api_prefix", &self.api_prefix),
            ("version_path", &self.version_path),
            ("logo_prefix", &self.logo_prefix),
            ("shell_path", &self.shell_path),
        ] {
            if !value.starts_with('/') {
                return Err(DugoutError::InvalidConfig {
                    field: field.to_string(),
                    reason: "must be an origin-relative path starting with '/'".to_string(),
                });
            }
        }

        if self.fallback_version.is_empty() {
            return Err(DugoutError::InvalidConfig {
                field: "fallback_version".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }

        if self.page_buffer == 0 {
            return Err(DugoutError::InvalidConfig {
                field: "page_buffer".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        self.preload.validate()?;
        Ok(())
    }

    /// Configuration for local development against a dev server.
    pub fn development() -> Self {
        Self {
            network: NetworkConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                connect_timeout: Duration::from_secs(1),
                request_timeout: Duration::from_secs(5),
            },
            ..Default::default()
        }
    }
}

/// Network settings for the outbound fetch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Origin every request URL is resolved against.
    pub base_url: String,
    /// Connect timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Total request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tip-genius.vercel.app".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Preload scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Identifiers per deferred batch.
    pub batch_size: usize,
    /// Minimum remaining idle budget required to do work in a slice.
    #[serde(with = "humantime_serde")]
    pub min_idle_budget: Duration,
    /// Delay between batches when the host has no idle-time facility.
    #[serde(with = "humantime_serde")]
    pub idle_fallback_delay: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            min_idle_budget: Duration::from_millis(10),
            idle_fallback_delay: Duration::from_millis(50),
        }
    }
}

impl PreloadConfig {
    /// Validate preload settings.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DugoutError::InvalidConfig {
                field: "preload.batch_size".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Serde helper for human-friendly duration strings (e.g. "10ms", "5s").
pub mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| e.to_string())
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|e| e.to_string())
        } else {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| format!("unrecognized duration: {}", s))
        }
    }
}
