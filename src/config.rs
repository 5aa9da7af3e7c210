use crate::cache::config::CacheConfig;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub hubspot: HubSpotConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// HubSpot OAuth app credentials and endpoints.
///
/// `client_id` and `client_secret` have no sensible defaults and are
/// expected to come from the environment (`CONNECT_HUBSPOT__CLIENT_ID`,
/// `CONNECT_HUBSPOT__CLIENT_SECRET`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub authorization_url: String,
    pub token_url: String,
    pub contacts_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            hubspot: HubSpotConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: "http://localhost:8000/integrations/hubspot/oauth2callback"
                    .to_string(),
                scope: "crm.objects.contacts.read crm.objects.contacts.write".to_string(),
                authorization_url: "https://app.hubspot.com/oauth/authorize".to_string(),
                token_url: "https://api.hubapi.com/oauth/v1/token".to_string(),
                contacts_url: "https://api.hubapi.com/crm/v3/objects/contacts".to_string(),
            },
            cache: CacheConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("CONNECT")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("CONNECT")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}
