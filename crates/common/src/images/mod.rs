//! Image store abstraction
//!
//! Maps opaque image ids to display URLs. The backing store (MinIO or
//! Firebase Storage) is picked once at configuration time; the engine only
//! consumes `resolve(image_id) -> url`. Resolution is treated as a possibly
//! slow, possibly failing external call.

use crate::config::ImageStoreConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for resolving image ids to display URLs
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolve a single image id to a URL
    async fn resolve(&self, image_id: Uuid) -> Result<String>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// MinIO-backed resolver
///
/// Uploads are stored as WebP objects in a public-read bucket, so display
/// URLs are plain object URLs.
pub struct MinioImageResolver {
    endpoint: String,
    bucket: String,
}

impl MinioImageResolver {
    pub fn new(endpoint: String, bucket: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
        }
    }
}

#[async_trait]
impl ImageResolver for MinioImageResolver {
    async fn resolve(&self, image_id: Uuid) -> Result<String> {
        Ok(format!(
            "{}/{}/{}.webp",
            self.endpoint, self.bucket, image_id
        ))
    }

    fn provider_name(&self) -> &str {
        "minio"
    }
}

/// Firebase Storage-backed resolver
pub struct FirebaseImageResolver {
    bucket: String,
}

impl FirebaseImageResolver {
    pub fn new(bucket: String) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl ImageResolver for FirebaseImageResolver {
    async fn resolve(&self, image_id: Uuid) -> Result<String> {
        Ok(format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}.webp?alt=media",
            self.bucket, image_id
        ))
    }

    fn provider_name(&self) -> &str {
        "firebase"
    }
}

/// Mock resolver for testing
pub struct MockImageResolver {
    fail: bool,
}

impl MockImageResolver {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A resolver whose every call fails
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageResolver for MockImageResolver {
    async fn resolve(&self, image_id: Uuid) -> Result<String> {
        if self.fail {
            return Err(AppError::ImageError {
                message: format!("Mock failure resolving image {}", image_id),
            });
        }
        Ok(format!("https://images.test/{}.webp", image_id))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

/// Create an image resolver based on configuration
pub fn create_image_resolver(config: &ImageStoreConfig) -> Result<Arc<dyn ImageResolver>> {
    match config.provider.as_str() {
        "minio" => {
            let endpoint = config.endpoint.clone().ok_or_else(|| AppError::Configuration {
                message: "MinIO image store requires an endpoint".to_string(),
            })?;
            Ok(Arc::new(MinioImageResolver::new(endpoint, config.bucket.clone())))
        }
        "firebase" => Ok(Arc::new(FirebaseImageResolver::new(config.bucket.clone()))),
        "mock" => Ok(Arc::new(MockImageResolver::new())),
        other => Err(AppError::Configuration {
            message: format!("Unknown image store provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_minio_url() {
        let resolver =
            MinioImageResolver::new("https://cdn.example.com/".into(), "wardrobe".into());
        let id = Uuid::new_v4();
        let url = resolver.resolve(id).await.unwrap();
        assert_eq!(url, format!("https://cdn.example.com/wardrobe/{}.webp", id));
    }

    #[tokio::test]
    async fn test_firebase_url() {
        let resolver = FirebaseImageResolver::new("vestia.appspot.com".into());
        let id = Uuid::new_v4();
        let url = resolver.resolve(id).await.unwrap();
        assert!(url.contains("vestia.appspot.com"));
        assert!(url.ends_with("?alt=media"));
    }

    #[test]
    fn test_factory_requires_minio_endpoint() {
        let config = ImageStoreConfig {
            provider: "minio".into(),
            endpoint: None,
            bucket: "wardrobe".into(),
        };
        assert!(create_image_resolver(&config).is_err());
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let resolver = MockImageResolver::failing();
        assert!(resolver.resolve(Uuid::new_v4()).await.is_err());
    }
}
