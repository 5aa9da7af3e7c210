use hubspot_connect::{Config, Server};
use url::Url;

/// Test harness wiring a server with the memory cache, optionally
/// pointed at a mock provider.
pub struct TestHarness {
    pub server: Server,
}

impl TestHarness {
    /// Harness against the real (unreachable in tests) provider endpoints.
    #[allow(dead_code)]
    pub async fn new() -> Self {
        Self {
            server: Server::new(Self::base_config()).await.unwrap(),
        }
    }

    /// Harness whose provider endpoints all point at `mock_uri`.
    pub async fn with_provider(mock_uri: &str) -> Self {
        let mut config = Self::base_config();
        config.hubspot.authorization_url = format!("{}/oauth/authorize", mock_uri);
        config.hubspot.token_url = format!("{}/oauth/v1/token", mock_uri);
        config.hubspot.contacts_url = format!("{}/crm/v3/objects/contacts", mock_uri);

        Self {
            server: Server::new(config).await.unwrap(),
        }
    }

    fn base_config() -> Config {
        let mut config = Config::default();
        config.cache.backend = "memory".to_string();
        config.hubspot.client_id = "test-client-id".to_string();
        config.hubspot.client_secret = "test-client-secret".to_string();
        config
    }
}

/// Extract the `state` query parameter from an authorization URL.
pub fn state_param(authorization_url: &str) -> String {
    let url = Url::parse(authorization_url).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("authorization URL should carry a state parameter")
}
