use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CourierConfig {
    pub webhook: WebhookConfig,
    pub media: MediaConfig,
    pub server: ServerConfig,
}

impl CourierConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("COURIER")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("webhook.urls"),
            )
            .set_default("webhook.urls", Vec::<String>::new())?
            .set_default("webhook.secret", "secret")?
            .set_default("webhook.dedup_ttl_secs", 300)?
            .set_default("media.storage_dir", "storages/media")?
            .set_default("media.max_file_bytes", 50 * 1024 * 1024)?
            .set_default("media.max_video_bytes", 100 * 1024 * 1024)?
            .set_default("server.port", 3000)?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("COURIER").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// Webhook subscriber configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Subscriber URLs notified for every inbound event
    #[serde(default)]
    pub urls: Vec<String>,
    /// Shared secret for payload signing
    pub secret: String,
    /// TTL of the duplicate-suppression window
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
}

impl WebhookConfig {
    pub fn new(urls: Vec<String>, secret: String) -> Self {
        Self {
            urls,
            secret,
            dedup_ttl_secs: default_dedup_ttl_secs(),
        }
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }
}

fn default_dedup_ttl_secs() -> u64 {
    300
}

/// Media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory where extracted media files are stored
    pub storage_dir: PathBuf,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_max_video_bytes() -> u64 {
    100 * 1024 * 1024
}

/// Server configuration
///
/// The port is echoed into every webhook payload so subscribers can tell
/// apart multiple instances posting to the same URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::load_from_env("COURIER_TEST_UNSET").unwrap();
        assert!(config.webhook.urls.is_empty());
        assert_eq!(config.webhook.dedup_ttl_secs, 300);
        assert_eq!(config.webhook.dedup_ttl(), Duration::from_secs(300));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.media.storage_dir, PathBuf::from("storages/media"));
    }
}
