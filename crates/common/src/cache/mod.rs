//! Cache backend for generation sessions
//!
//! Provides:
//! - A narrow `CacheBackend` trait (get/set-with-TTL/delete) injected into
//!   consumers instead of a process-wide cache singleton
//! - Redis implementation with connection management and key namespacing
//! - In-memory implementation for tests
//! - JSON (de)serialization helpers and cache key builders

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "vestia".to_string(),
        }
    }
}

/// Narrow cache contract consumed by the engine.
///
/// Values are opaque strings; TTL expiry is enforced by the backend, not by
/// the caller.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a raw value
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Set a raw value with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Get and deserialize a JSON value from a cache backend
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheBackend,
    key: &str,
) -> Result<Option<T>> {
    match cache.get_raw(key).await? {
        Some(json) => {
            let parsed = serde_json::from_str(&json).map_err(|e| AppError::CacheError {
                message: format!("Failed to parse cached value for '{}': {}", key, e),
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Serialize and set a JSON value on a cache backend
pub async fn set_json<T: Serialize>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| AppError::CacheError {
        message: format!("Failed to serialize value for '{}': {}", key, e),
    })?;
    cache.set_raw(key, &json, ttl).await
}

/// Redis cache client
pub struct RedisCache {
    connection: RwLock<MultiplexedConnection>,
    config: CacheConfig,
}

impl RedisCache {
    /// Create a new cache client
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| AppError::CacheError {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            config,
        })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.write().await;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let value: Option<String> =
            conn.get(&full_key)
                .await
                .map_err(|e| AppError::CacheError {
                    message: format!("Failed to get key '{}': {}", full_key, e),
                })?;

        match &value {
            Some(_) => debug!(key = %full_key, "Cache hit"),
            None => debug!(key = %full_key, "Cache miss"),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        conn.set_ex(&full_key, value, ttl.as_secs())
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to set key '{}': {}", full_key, e),
            })?;

        debug!(key = %full_key, ttl_secs = ttl.as_secs(), "Cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let deleted: i32 = conn.del(&full_key).await.map_err(|e| AppError::CacheError {
            message: format!("Failed to delete key '{}': {}", full_key, e),
        })?;

        debug!(key = %full_key, deleted = deleted > 0, "Cache delete");
        Ok(deleted > 0)
    }
}

/// In-memory cache backend for tests
///
/// Honors TTLs on read so expiry behavior can be exercised without Redis.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(key).is_some())
    }
}

/// Cache key builder helpers
pub mod keys {
    use uuid::Uuid;

    /// Build a generation session cache key.
    ///
    /// The occasion must already be normalized; callers that disagree on
    /// normalization would otherwise address different sessions.
    pub fn generation_session(user_id: Uuid, normalized_occasion: &str) -> String {
        format!("quick-gen:{}:{}", user_id, normalized_occasion)
    }
}
