//! Asset manifest for install-time precaching.
//!
//! The manifest is the fixed, ordered list of URL patterns that qualify for
//! the static store: exact paths (precached at install) and path-prefix
//! patterns covering image directories.

use serde::{Deserialize, Serialize};

/// The set of URL patterns that qualify for static caching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Exact paths, precached during install in order.
    pub paths: Vec<String>,
    /// Path prefixes (image directories and the like); matched at fetch
    /// time, never precached wholesale.
    pub prefixes: Vec<String>,
}

impl AssetManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// The application-shell manifest used by the prediction client.
    pub fn app_shell() -> Self {
        Self {
            paths: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/favicon.ico".to_string(),
                "/apple-touch-icon.png".to_string(),
            ],
            prefixes: vec!["/icons/".to_string(), "/images/".to_string()],
        }
    }

    /// Add an exact path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Add a path-prefix pattern.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Check whether a request path matches the manifest.
    pub fn matches(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
            || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// The exact paths to precache at install, in manifest order.
    pub fn precache_paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Whether the manifest lists nothing at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.prefixes.is_empty()
    }
}
