//! Request routing.
//!
//! Route precedence is a first-class contract: an ordered list of
//! (predicate, strategy) rules evaluated top-down, first match wins. The
//! table is pure data, so precedence is directly testable without an agent.

use crate::config::AgentConfig;
use crate::manifest::AssetManifest;
use serde::{Deserialize, Serialize};

/// Caching strategy applied to a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Network first, cached copy on failure, stale-data broadcast.
    NetworkFirst,
    /// Network first; a success also refreshes the static store copy.
    VersionRefresh,
    /// Cache first, long-lived; a miss fetches once and stores the result.
    CacheFirst,
    /// Serve cached immediately, refresh the cache in the background.
    StaleWhileRevalidate,
    /// No category matched: cached shell for navigations, failure otherwise.
    OfflineFallback,
}

/// Predicate over the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePredicate {
    /// Exact path match.
    Exact(String),
    /// Path-prefix match.
    Prefix(String),
    /// Matches the asset manifest (exact entries and prefix patterns).
    Manifest,
    /// Matches everything.
    Any,
}

impl RoutePredicate {
    /// Test the predicate against a request path.
    pub fn matches(&self, path: &str, manifest: &AssetManifest) -> bool {
        match self {
            RoutePredicate::Exact(p) => p == path,
            RoutePredicate::Prefix(p) => path.starts_with(p.as_str()),
            RoutePredicate::Manifest => manifest.matches(path),
            RoutePredicate::Any => true,
        }
    }
}

/// One ordered routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Predicate tested against the request path.
    pub predicate: RoutePredicate,
    /// Strategy applied when the predicate matches.
    pub strategy: Strategy,
}

impl RouteRule {
    /// Rule matching an exact path.
    pub fn exact(path: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            predicate: RoutePredicate::Exact(path.into()),
            strategy,
        }
    }

    /// Rule matching a path prefix.
    pub fn prefix(prefix: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            predicate: RoutePredicate::Prefix(prefix.into()),
            strategy,
        }
    }

    /// Rule matching the asset manifest.
    pub fn manifest(strategy: Strategy) -> Self {
        Self {
            predicate: RoutePredicate::Manifest,
            strategy,
        }
    }

    /// Catch-all rule.
    pub fn fallback() -> Self {
        Self {
            predicate: RoutePredicate::Any,
            strategy: Strategy::OfflineFallback,
        }
    }
}

/// Ordered routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    rules: Vec<RouteRule>,
}

impl Router {
    /// Build a router from explicit rules.
    pub fn with_rules(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The standard table for the prediction client.
    ///
    /// Order matters: the logo prefix sits under the broader manifest image
    /// prefix and must be tested first.
    pub fn standard(config: &AgentConfig) -> Self {
        Self::with_rules(vec![
            RouteRule::prefix(config.api_prefix.clone(), Strategy::NetworkFirst),
            RouteRule::exact(config.version_path.clone(), Strategy::VersionRefresh),
            RouteRule::prefix(config.logo_prefix.clone(), Strategy::CacheFirst),
            RouteRule::manifest(Strategy::StaleWhileRevalidate),
            RouteRule::fallback(),
        ])
    }

    /// Classify a request path, top-down, first match wins.
    pub fn classify(&self, path: &str, manifest: &AssetManifest) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(path, manifest))
            .map(|rule| rule.strategy)
            .unwrap_or(Strategy::OfflineFallback)
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}
