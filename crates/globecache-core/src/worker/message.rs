use serde::{Deserialize, Serialize};

use crate::error::{WorkerError, WorkerResult};

/// Control messages a hosting page can post to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// `{ "type": "SKIP_WAITING" }`
    SkipWaiting,
    /// `{ "type": "CACHE_URLS", "urls": [...] }`
    CacheUrls { urls: Vec<String> },
}

const KNOWN_TYPES: &[&str] = &["SKIP_WAITING", "CACHE_URLS"];

impl ClientMessage {
    /// Recognize a message posted by a page.
    ///
    /// Data without a known `type` is not for us and yields `None`. A known
    /// type with a malformed payload is an error.
    pub fn parse(data: &serde_json::Value) -> WorkerResult<Option<Self>> {
        let known = data
            .get("type")
            .and_then(|t| t.as_str())
            .map(|t| KNOWN_TYPES.contains(&t))
            .unwrap_or(false);
        if !known {
            return Ok(None);
        }
        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| WorkerError::InvalidMessage(e.to_string()))
    }
}
