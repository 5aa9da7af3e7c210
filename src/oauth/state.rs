use crate::cache::CachedObject;
use crate::error::AppError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use oauth2::CsrfToken;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OAuth state entry TTL (10 minutes)
pub const OAUTH_STATE_TTL_SECONDS: u64 = 600;

/// Per-authorize-call state: a random nonce bound to the user/org pair
/// that started the flow.
///
/// The blob travels through the provider inside the `state` query
/// parameter as URL-safe base64 of its JSON form. The encoding is
/// reversible and carries no signature: the only integrity check is the
/// comparison against the copy cached server-side under
/// `oauth_state:{org_id}:{user_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateData {
    pub nonce: String,
    pub user_id: String,
    pub org_id: String,
}

impl StateData {
    /// Create state for a new authorize call with a fresh 32-byte nonce.
    pub fn new(user_id: &str, org_id: &str) -> Self {
        Self {
            nonce: CsrfToken::new_random_len(32).into_secret(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        }
    }

    /// Encode into the opaque `state` query parameter value.
    pub fn encode(&self) -> Result<String, AppError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize state: {}", e)))?;
        Ok(URL_SAFE.encode(json))
    }

    /// Decode a `state` query parameter value back into state data.
    pub fn decode(encoded: &str) -> Result<Self, AppError> {
        let json = URL_SAFE
            .decode(encoded)
            .map_err(|e| AppError::MalformedState(format!("Invalid base64: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| AppError::MalformedState(format!("Invalid state payload: {}", e)))
    }

    /// Cache key shared with the credential entry: `{org_id}:{user_id}`.
    pub fn cache_key(org_id: &str, user_id: &str) -> String {
        format!("{}:{}", org_id, user_id)
    }
}

impl CachedObject for StateData {
    fn cache_prefix() -> &'static str {
        "oauth_state"
    }

    fn default_ttl() -> Option<Duration> {
        Some(Duration::from_secs(OAUTH_STATE_TTL_SECONDS))
    }
}
