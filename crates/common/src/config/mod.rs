//! Configuration management for Vestia services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration (generation sessions)
    pub redis: RedisConfig,

    /// Recommendation provider configuration
    pub recommender: RecommenderConfig,

    /// Image store configuration
    pub images: ImageStoreConfig,

    /// Generation engine configuration
    pub generation: GenerationConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,

    /// Pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: u32,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommenderConfig {
    /// Recommendation provider: gemini, openai-compatible, mock
    #[serde(default = "default_recommender_provider")]
    pub provider: String,

    /// API key for the provider
    pub api_key: Option<String>,

    /// API base URL (for Ollama / LM Studio / custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_recommender_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_recommender_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageStoreConfig {
    /// Image store provider: minio, firebase, mock
    #[serde(default = "default_image_provider")]
    pub provider: String,

    /// Object store endpoint (MinIO)
    pub endpoint: Option<String>,

    /// Bucket name
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

/// Constants governing outfit generation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Minimum active wardrobe items required for quick generation
    #[serde(default = "default_min_wardrobe_items")]
    pub min_wardrobe_items: u64,

    /// Minimum items in a generated outfit
    #[serde(default = "default_min_outfit_size")]
    pub min_outfit_size: usize,

    /// Maximum items in a generated outfit
    #[serde(default = "default_max_outfit_size")]
    pub max_outfit_size: usize,

    /// Generation session TTL in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Total recommendation attempts in quick mode (1 initial + retries)
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_redis_pool_size() -> u32 { 20 }
fn default_key_prefix() -> String { "vestia".to_string() }
fn default_recommender_provider() -> String { "gemini".to_string() }
fn default_recommender_model() -> String { "gemini-1.5-flash".to_string() }
fn default_temperature() -> f32 { 0.0 }
fn default_recommender_timeout() -> u64 { 30 }
fn default_image_provider() -> String { "minio".to_string() }
fn default_bucket() -> String { "wardrobe-images".to_string() }
fn default_min_wardrobe_items() -> u64 { 5 }
fn default_min_outfit_size() -> usize { 3 }
fn default_max_outfit_size() -> usize { 10 }
fn default_session_ttl() -> u64 { 3600 }
fn default_retry_max_attempts() -> u32 { 2 }
fn default_retry_delay_ms() -> u64 { 2000 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "vestia".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__REDIS__URL=redis://cache:6379
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl GenerationConfig {
    /// Session TTL as a Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_wardrobe_items: default_min_wardrobe_items(),
            min_outfit_size: default_min_outfit_size(),
            max_outfit_size: default_max_outfit_size(),
            session_ttl_secs: default_session_ttl(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/vestia".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                pool_size: default_redis_pool_size(),
                key_prefix: default_key_prefix(),
            },
            recommender: RecommenderConfig {
                provider: default_recommender_provider(),
                api_key: None,
                api_base: None,
                model: default_recommender_model(),
                temperature: default_temperature(),
                timeout_secs: default_recommender_timeout(),
            },
            images: ImageStoreConfig {
                provider: default_image_provider(),
                endpoint: None,
                bucket: default_bucket(),
            },
            generation: GenerationConfig::default(),
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                service_name: default_service_name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.generation.min_wardrobe_items, 5);
        assert_eq!(config.generation.min_outfit_size, 3);
        assert_eq!(config.generation.max_outfit_size, 10);
        assert_eq!(config.recommender.provider, "gemini");
    }

    #[test]
    fn test_retry_contract_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.retry_max_attempts, 2);
        assert_eq!(config.retry_delay(), Duration::from_millis(2000));
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/vestia");
    }
}
