use crate::{config::Config, server::Server};

/// Test server builder for creating test instances with the memory cache
pub struct TestServerBuilder {
    config: Config,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.cache.backend = "memory".to_string();
        config.hubspot.client_id = "test-client-id".to_string();
        config.hubspot.client_secret = "test-client-secret".to_string();
        Self { config }
    }

    /// Set a custom configuration (the cache backend is forced to memory)
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build the test server with configured settings
    pub async fn build(self) -> Server {
        let mut config = self.config;
        config.cache.backend = "memory".to_string();

        Server::new(config).await.unwrap()
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
