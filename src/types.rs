//! Core type definitions for the dugout caching layer.
//!
//! This module contains the data types shared across the crate: the request
//! and response values that flow through the cache agent, the version
//! descriptor that mints cache generations, and the prediction wire model
//! consumed by the preload scheduler.
//!
//! # Key Types
//!
//! - [`FetchRequest`]: an intercepted outbound request (URL + mode)
//! - [`StoredResponse`]: a response body as it lives in a cache store
//! - [`VersionDescriptor`]: the `/version.json` payload
//! - [`League`] / [`MatchPrediction`]: the prediction dataset
//!
//! # Examples
//!
//! ```rust
//! use dugout::types::{FetchRequest, RequestMode};
//!
//! let req = FetchRequest::get("/api/predictions?key=Mistral-Large");
//! assert_eq!(req.path(), "/api/predictions");
//! assert_eq!(req.mode, RequestMode::Resource);
//! ```

use crate::error::{DugoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a request was initiated by the client.
///
/// Navigation requests degrade to the cached application shell when both the
/// network and the cache miss; everything else surfaces an explicit failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// A top-level document navigation.
    Navigate,
    /// Any subresource request (data, image, style).
    #[default]
    Resource,
}

/// An intercepted outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Request URL, path-relative to the origin, query string included.
    pub url: String,
    /// Request mode.
    #[serde(default)]
    pub mode: RequestMode,
}

impl FetchRequest {
    /// Create a plain subresource request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Resource,
        }
    }

    /// Create a navigation request.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Navigate,
        }
    }

    /// The path component of the URL, without the query string.
    pub fn path(&self) -> &str {
        match self.url.split_once('?') {
            Some((path, _)) => path,
            None => &self.url,
        }
    }

    /// The cache key for this request. The full URL including the query
    /// string, so `?key=A` and `?key=B` occupy distinct entries.
    pub fn cache_key(&self) -> &str {
        &self.url
    }
}

/// A response as fetched from the network or stored in a cache store.
///
/// Cache writes are idempotent overwrites of these values; cloning one is
/// cheap enough for the clone-into-cache pattern the agent relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content type, when the origin supplied one.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
    /// When the response was fetched from the network.
    pub fetched_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Create a 200 OK response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// Create a 200 OK response carrying a JSON-serialized value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::ok(body).with_content_type("application/json"))
    }

    /// The explicit not-found response returned instead of propagating a
    /// failed image fetch.
    pub fn not_found() -> Self {
        Self::new(404, Vec::new())
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether this is an HTTP 200 response.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Body as UTF-8 text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The build/version descriptor served at the version path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Opaque build version, e.g. `2501020930`.
    pub version: String,
    /// When the build was produced.
    #[serde(rename = "buildDate")]
    pub build_date: Option<DateTime<Utc>>,
}

/// One league's worth of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    /// League display name, e.g. `Bundesliga`.
    pub name: String,
    /// When the predictions were generated, as published upstream.
    pub timestamp: String,
    /// The predicted matches.
    pub matches: Vec<MatchPrediction>,
}

/// A single AI-generated match prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    /// Home team display name.
    pub home_team: String,
    /// Away team display name.
    pub away_team: String,
    /// Home team logo identifier, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_logo: Option<String>,
    /// Away team logo identifier, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_logo: Option<String>,
    /// Kickoff time in `DD.MM.YYYY HH:MM` local display format.
    pub commence_time_str: String,
    /// One-line outlook for the match.
    pub outlook: String,
    /// Predicted home goals.
    pub prediction_home: i32,
    /// Predicted away goals.
    pub prediction_away: i32,
    /// Model reasoning, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Decode a prediction-API response body.
///
/// The key-value proxy either wraps the league array as
/// `{"result": "<json-encoded-array>"}` or returns the bare array. Content
/// is decoded but never validated or transformed beyond that.
pub fn decode_predictions(body: &[u8]) -> Result<Vec<League>> {
    let value: serde_json::Value = serde_json::from_slice(body)?;

    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(ref map) => {
            let result = map.get("result").ok_or_else(|| {
                DugoutError::Serialization("expected 'result' field or bare array".to_string())
            })?;
            match result {
                serde_json::Value::String(encoded) => Ok(serde_json::from_str(encoded)?),
                serde_json::Value::Array(_) => Ok(serde_json::from_value(result.clone())?),
                _ => Err(DugoutError::Serialization(
                    "'result' is neither a string nor an array".to_string(),
                )),
            }
        }
        _ => Err(DugoutError::Serialization(
            "prediction payload is neither an object nor an array".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> MatchPrediction {
        MatchPrediction {
            home_team: "FC Bayern München".to_string(),
            away_team: "Borussia Dortmund".to_string(),
            home_logo: Some("fc-bayern-muenchen".to_string()),
            away_logo: Some("borussia-dortmund".to_string()),
            commence_time_str: "25.01.2025 18:30".to_string(),
            outlook: "Home win".to_string(),
            prediction_home: 2,
            prediction_away: 1,
            reasoning: None,
        }
    }

    #[test]
    fn test_request_path_strips_query() {
        let req = FetchRequest::get("/api/predictions?key=Mistral-Large");
        assert_eq!(req.path(), "/api/predictions");
        assert_eq!(req.cache_key(), "/api/predictions?key=Mistral-Large");
    }

    #[test]
    fn test_request_path_without_query() {
        let req = FetchRequest::get("/version.json");
        assert_eq!(req.path(), "/version.json");
    }

    #[test]
    fn test_navigation_mode() {
        assert_eq!(FetchRequest::navigate("/").mode, RequestMode::Navigate);
        assert_eq!(FetchRequest::get("/x").mode, RequestMode::Resource);
    }

    #[test]
    fn test_response_success() {
        assert!(StoredResponse::ok(b"body".to_vec()).is_success());
        assert!(!StoredResponse::not_found().is_success());
        assert!(!StoredResponse::new(304, Vec::new()).is_success());
    }

    #[test]
    fn test_response_json() {
        let resp = StoredResponse::json(&vec!["a", "b"]).unwrap();
        assert_eq!(resp.content_type.as_deref(), Some("application/json"));
        assert_eq!(resp.text(), r#"["a","b"]"#);
    }

    #[test]
    fn test_version_descriptor_field_rename() {
        let desc: VersionDescriptor =
            serde_json::from_str(r#"{"version":"2501020930","buildDate":"2025-01-02T09:30:00Z"}"#)
                .unwrap();
        assert_eq!(desc.version, "2501020930");
        assert!(desc.build_date.is_some());
    }

    #[test]
    fn test_version_descriptor_without_build_date() {
        let desc: VersionDescriptor = serde_json::from_str(r#"{"version":"2501020930"}"#).unwrap();
        assert_eq!(desc.version, "2501020930");
        assert!(desc.build_date.is_none());
    }

    #[test]
    fn test_decode_bare_array() {
        let league = League {
            name: "Bundesliga".to_string(),
            timestamp: "2025-01-24 06:00".to_string(),
            matches: vec![sample_match()],
        };
        let body = serde_json::to_vec(&vec![league.clone()]).unwrap();

        let decoded = decode_predictions(&body).unwrap();
        assert_eq!(decoded, vec![league]);
    }

    #[test]
    fn test_decode_result_envelope() {
        let league = League {
            name: "Premier League".to_string(),
            timestamp: "2025-01-24 06:00".to_string(),
            matches: vec![sample_match()],
        };
        let encoded = serde_json::to_string(&vec![league.clone()]).unwrap();
        let body = serde_json::to_vec(&serde_json::json!({ "result": encoded })).unwrap();

        let decoded = decode_predictions(&body).unwrap();
        assert_eq!(decoded, vec![league]);
    }

    #[test]
    fn test_decode_result_array_envelope() {
        let league = League {
            name: "La Liga".to_string(),
            timestamp: "2025-01-24 06:00".to_string(),
            matches: vec![],
        };
        let body =
            serde_json::to_vec(&serde_json::json!({ "result": vec![league.clone()] })).unwrap();

        let decoded = decode_predictions(&body).unwrap();
        assert_eq!(decoded, vec![league]);
    }

    #[test]
    fn test_decode_rejects_scalar() {
        assert!(decode_predictions(b"42").is_err());
        assert!(decode_predictions(br#"{"result": 42}"#).is_err());
    }

    #[test]
    fn test_match_optional_fields_default() {
        let json = r#"{
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "commence_time_str": "26.01.2025 17:30",
            "outlook": "Draw",
            "prediction_home": 1,
            "prediction_away": 1
        }"#;
        let m: MatchPrediction = serde_json::from_str(json).unwrap();
        assert!(m.home_logo.is_none());
        assert!(m.reasoning.is_none());
    }
}
