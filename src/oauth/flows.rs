use crate::{
    cache::{CacheManager, CachedObject, TypedCache},
    config::Config,
    error::AppError,
    oauth::{
        client::{Oauth2Client, build_oauth_client},
        state::{OAUTH_STATE_TTL_SECONDS, StateData},
    },
};
use oauth2::{CsrfToken, Scope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub authorization_url: String,
}

/// Query parameters HubSpot sends to the redirect URI.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The token endpoint's response body, cached verbatim so the record the
/// consumer receives is exactly what the provider issued.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub body: String,
}

impl CachedObject for StoredCredentials {
    fn cache_prefix() -> &'static str {
        "credentials"
    }

    fn default_ttl() -> Option<Duration> {
        Some(Duration::from_secs(OAUTH_STATE_TTL_SECONDS))
    }
}

/// OAuth flow handlers
pub struct OAuthFlows {
    config: Arc<Config>,
    oauth_client: Oauth2Client,
    http_client: reqwest::Client,
    cache: CacheManager,
}

impl OAuthFlows {
    pub fn new(config: Arc<Config>, cache: CacheManager) -> Result<Self, AppError> {
        let oauth_client = build_oauth_client(&config.hubspot)?;
        Ok(Self {
            config,
            oauth_client,
            http_client: reqwest::Client::new(),
            cache,
        })
    }

    fn state_cache(&self) -> TypedCache<StateData> {
        self.cache.cache::<StateData>()
    }

    fn credentials_cache(&self) -> TypedCache<StoredCredentials> {
        self.cache.cache::<StoredCredentials>()
    }

    /// Build the authorize redirect URL for a user/org pair.
    ///
    /// The freshly generated state is cached under
    /// `oauth_state:{org_id}:{user_id}` before the URL is returned, so the
    /// callback can compare nonces. Concurrent calls for the same pair
    /// race on that key with last-write-wins.
    pub async fn authorization_url(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<AuthorizeResponse, AppError> {
        let state = StateData::new(user_id, org_id);
        let encoded_state = state.encode()?;

        let mut request = self
            .oauth_client
            .authorize_url(|| CsrfToken::new(encoded_state));
        for scope in self.config.hubspot.scope.split_whitespace() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (authorization_url, _csrf_token) = request.url();

        self.state_cache()
            .set(&StateData::cache_key(org_id, user_id), &state)
            .await?;

        Ok(AuthorizeResponse {
            authorization_url: authorization_url.to_string(),
        })
    }

    /// Validate the provider callback and exchange the code for a token.
    ///
    /// On success the token endpoint's raw JSON body is cached under
    /// `credentials:{org_id}:{user_id}`. The state entry is left in place
    /// and disappears on TTL expiry.
    pub async fn handle_callback(&self, query: &CallbackQuery) -> Result<(), AppError> {
        if let Some(error) = &query.error {
            let detail = query
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            return Err(AppError::Provider(detail));
        }

        let encoded_state = query.state.as_deref().ok_or_else(|| {
            AppError::MalformedState("callback missing state parameter".to_string())
        })?;
        let state = StateData::decode(encoded_state)?;

        let code = query.code.as_deref().ok_or_else(|| {
            AppError::MalformedState("callback missing authorization code".to_string())
        })?;

        let key = StateData::cache_key(&state.org_id, &state.user_id);
        let saved_state = self
            .state_cache()
            .get(&key)
            .await?
            .ok_or(AppError::StateMismatch)?;

        if saved_state.nonce != state.nonce {
            return Err(AppError::StateMismatch);
        }

        let body = self.exchange_code(code).await?;

        self.credentials_cache()
            .set(&key, &StoredCredentials { body })
            .await?;

        tracing::debug!(
            user_id = %state.user_id,
            org_id = %state.org_id,
            "stored credentials after token exchange"
        );

        Ok(())
    }

    /// One authorization-code grant POST against the token endpoint,
    /// returning the raw response body.
    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let hubspot = &self.config.hubspot;
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", hubspot.client_id.as_str()),
            ("client_secret", hubspot.client_secret.as_str()),
            ("redirect_uri", hubspot.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self
            .http_client
            .post(&hubspot.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::TokenExchange(format!("unreadable token response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "token endpoint returned {}",
                status
            )));
        }

        // The record must at least be JSON before it is cached verbatim
        serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
            AppError::TokenExchange(format!("token endpoint returned invalid JSON: {}", e))
        })?;

        Ok(body)
    }

    /// Retrieve the cached credentials for a user/org pair and delete them.
    ///
    /// Single-use: a second call for the same pair fails with
    /// `NoCredentials`, as does any call after the 600 s expiry.
    pub async fn fetch_and_consume_credentials(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let key = StateData::cache_key(org_id, user_id);
        let cache = self.credentials_cache();

        let stored = cache.get(&key).await?.ok_or(AppError::NoCredentials)?;
        cache.delete(&key).await?;

        serde_json::from_str(&stored.body)
            .map_err(|e| AppError::Internal(format!("cached credentials are not valid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn test_flows() -> OAuthFlows {
        let mut config = Config::default();
        config.hubspot.client_id = "test-client-id".to_string();
        config.hubspot.client_secret = "test-client-secret".to_string();
        OAuthFlows::new(Arc::new(config), CacheManager::new_memory()).unwrap()
    }

    fn state_param(authorization_url: &str) -> String {
        let url = Url::parse(authorization_url).unwrap();
        url.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorization_url_carries_the_expected_parameters() {
        let flows = test_flows();
        let response = flows.authorization_url("alice", "acme").await.unwrap();

        let url = Url::parse(&response.authorization_url).unwrap();
        assert!(
            response
                .authorization_url
                .starts_with("https://app.hubspot.com/oauth/authorize")
        );

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let value = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(value("client_id"), Some("test-client-id".to_string()));
        assert_eq!(value("response_type"), Some("code".to_string()));
        assert_eq!(
            value("redirect_uri"),
            Some("http://localhost:8000/integrations/hubspot/oauth2callback".to_string())
        );
        assert_eq!(
            value("scope"),
            Some("crm.objects.contacts.read crm.objects.contacts.write".to_string())
        );
        assert!(value("state").is_some());
    }

    #[tokio::test]
    async fn test_authorization_url_state_embeds_identity_and_is_cached() {
        let flows = test_flows();
        let response = flows.authorization_url("alice", "acme").await.unwrap();

        let decoded = StateData::decode(&state_param(&response.authorization_url)).unwrap();
        assert_eq!(decoded.user_id, "alice");
        assert_eq!(decoded.org_id, "acme");

        let cached = flows
            .state_cache()
            .get(&StateData::cache_key("acme", "alice"))
            .await
            .unwrap()
            .expect("state should be cached after authorize");
        assert_eq!(cached.nonce, decoded.nonce);
    }

    #[tokio::test]
    async fn test_concurrent_authorize_last_write_wins() {
        let flows = test_flows();
        let first = flows.authorization_url("alice", "acme").await.unwrap();
        let second = flows.authorization_url("alice", "acme").await.unwrap();

        let first_state = StateData::decode(&state_param(&first.authorization_url)).unwrap();
        let second_state = StateData::decode(&state_param(&second.authorization_url)).unwrap();

        let cached = flows
            .state_cache()
            .get(&StateData::cache_key("acme", "alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.nonce, second_state.nonce);
        assert_ne!(cached.nonce, first_state.nonce);
    }

    #[tokio::test]
    async fn test_callback_with_provider_error() {
        let flows = test_flows();
        let query = CallbackQuery {
            code: None,
            state: None,
            error: Some("access_denied".to_string()),
            error_description: Some("User rejected the request".to_string()),
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        match err {
            AppError::Provider(detail) => assert_eq!(detail, "User rejected the request"),
            other => panic!("expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callback_provider_error_falls_back_to_error_code() {
        let flows = test_flows();
        let query = CallbackQuery {
            code: None,
            state: None,
            error: Some("access_denied".to_string()),
            error_description: None,
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        match err {
            AppError::Provider(detail) => assert_eq!(detail, "access_denied"),
            other => panic!("expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callback_missing_state_is_malformed() {
        let flows = test_flows();
        let query = CallbackQuery {
            code: Some("auth-code".to_string()),
            state: None,
            error: None,
            error_description: None,
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedState(_)));
    }

    #[tokio::test]
    async fn test_callback_undecodable_state_is_malformed() {
        let flows = test_flows();
        let query = CallbackQuery {
            code: Some("auth-code".to_string()),
            state: Some("%%%not-base64%%%".to_string()),
            error: None,
            error_description: None,
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedState(_)));
    }

    #[tokio::test]
    async fn test_callback_without_cached_state_is_a_mismatch() {
        let flows = test_flows();
        // Forged state: valid encoding, but nothing was cached for the pair
        let forged = StateData::new("alice", "acme");
        let query = CallbackQuery {
            code: Some("auth-code".to_string()),
            state: Some(forged.encode().unwrap()),
            error: None,
            error_description: None,
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        assert!(matches!(err, AppError::StateMismatch));
    }

    #[tokio::test]
    async fn test_callback_with_different_nonce_is_a_mismatch() {
        let flows = test_flows();
        flows.authorization_url("alice", "acme").await.unwrap();

        // Same user/org, different nonce than the cached one
        let forged = StateData::new("alice", "acme");
        let query = CallbackQuery {
            code: Some("auth-code".to_string()),
            state: Some(forged.encode().unwrap()),
            error: None,
            error_description: None,
        };

        let err = flows.handle_callback(&query).await.unwrap_err();
        assert!(matches!(err, AppError::StateMismatch));
    }

    #[tokio::test]
    async fn test_fetch_and_consume_without_credentials() {
        let flows = test_flows();
        let err = flows
            .fetch_and_consume_credentials("alice", "acme")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCredentials));
    }

    #[tokio::test]
    async fn test_fetch_and_consume_is_single_use() {
        let flows = test_flows();
        let body = r#"{"access_token":"tok","token_type":"bearer"}"#.to_string();
        flows
            .credentials_cache()
            .set(
                &StateData::cache_key("acme", "alice"),
                &StoredCredentials { body },
            )
            .await
            .unwrap();

        let record = flows
            .fetch_and_consume_credentials("alice", "acme")
            .await
            .unwrap();
        assert_eq!(record["access_token"], "tok");

        let err = flows
            .fetch_and_consume_credentials("alice", "acme")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCredentials));
    }
}
