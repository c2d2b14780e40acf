//! Request DTOs for the cache node API

use serde::{Deserialize, Serialize};

use crate::cache::MAX_KEY_LENGTH;

/// Body of `POST /set`, also the payload of replica writes.
///
/// Both fields are required; a body missing either fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
}

impl SetRequest {
    /// Returns an error message if the request is unusable, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Query string of `GET /get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    pub key: Option<String>,
}

impl GetQuery {
    /// The requested key, or a message explaining why there is none.
    pub fn require_key(self) -> Result<String, String> {
        let key = self.key.ok_or_else(|| "Missing query parameter 'key'".to_string())?;
        match validate_key(&key) {
            Some(msg) => Err(msg),
            None => Ok(key),
        }
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
