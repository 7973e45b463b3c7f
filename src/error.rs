//! Error types for the dugout caching layer.
//!
//! This module provides a unified error type [`DugoutError`] for all dugout
//! operations, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Version resolution**: the version descriptor was unreachable (non-fatal,
//!   callers fall back to a pinned identifier)
//! - **Precache**: a single manifest entry failed during install (non-fatal,
//!   install continues)
//! - **Network**: a routed request failed at the transport layer (handled
//!   per route, never retried automatically)
//! - **Offline**: neither the network nor the cache could satisfy a request
//! - **Configuration**: invalid settings or unreadable configuration
//!
//! A cache miss is not an error anywhere in this crate; lookups return
//! `Option` and routes branch on it.
//!
//! # Example
//!
//! ```rust
//! use dugout::error::{DugoutError, Result};
//!
//! fn check_store_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(DugoutError::InvalidStoreName("name cannot be empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use thiserror::Error;

/// Main error type for dugout operations.
#[derive(Error, Debug)]
pub enum DugoutError {
    // Version resolution errors
    #[error("Version descriptor unreachable: {0}")]
    VersionResolution(String),

    #[error("Malformed version descriptor: {0}")]
    VersionParse(String),

    // Install-time precache errors
    #[error("Failed to precache {path}: {reason}")]
    AssetPrecache { path: String, reason: String },

    // Routed request errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Offline and not cached: {0}")]
    OfflineUnavailable(String),

    // Store errors
    #[error("Cache store not found: {0}")]
    StoreNotFound(String),

    #[error("Invalid store name: {0}")]
    InvalidStoreName(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // Lifecycle errors
    #[error("Invalid agent state: {0}")]
    InvalidState(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // External errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DugoutError {
    /// Check if the error is retryable at a later time.
    ///
    /// Transport-level failures may succeed on a future attempt once
    /// connectivity returns; everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DugoutError::Network(_)
                | DugoutError::Timeout(_)
                | DugoutError::VersionResolution(_)
                | DugoutError::OfflineUnavailable(_)
        )
    }

    /// Check if the error means the request could not be satisfied offline.
    pub fn is_offline(&self) -> bool {
        matches!(self, DugoutError::OfflineUnavailable(_))
    }
}

impl From<serde_json::Error> for DugoutError {
    fn from(e: serde_json::Error) -> Self {
        DugoutError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for DugoutError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DugoutError::Timeout(e.to_string())
        } else {
            DugoutError::Network(e.to_string())
        }
    }
}

/// Result type alias for dugout operations.
pub type Result<T> = std::result::Result<T, DugoutError>;
