//! Error types for the Vestia engine
//!
//! Provides:
//! - Distinct error types for validation, generation, and lifecycle failures
//! - Error codes for client handling
//! - Severity and retryability classification
//!
//! Infrastructure failures (database, cache, recommendation provider, image
//! store) are converted at the component boundary; callers of the engine only
//! ever see `AppError`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Generation errors (2xxx)
    InsufficientItems,
    NoAlternatives,
    InvalidOutfitSize,
    GenerationFailed,
    RecommendationAssembly,

    // Resource errors (4xxx)
    NotFound,
    InactiveCombination,

    // Conflict errors (5xxx)
    DuplicateItem,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    RecommendationError,
    ImageError,
    CacheError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,

            // Generation (2xxx)
            ErrorCode::InsufficientItems => 2001,
            ErrorCode::NoAlternatives => 2002,
            ErrorCode::InvalidOutfitSize => 2003,
            ErrorCode::GenerationFailed => 2004,
            ErrorCode::RecommendationAssembly => 2005,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::InactiveCombination => 4002,

            // Conflicts (5xxx)
            ErrorCode::DuplicateItem => 5001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // External (8xxx)
            ErrorCode::RecommendationError => 8001,
            ErrorCode::ImageError => 8002,
            ErrorCode::CacheError => 8003,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Generation errors
    #[error("Insufficient wardrobe items: {count} active, at least {required} required")]
    InsufficientWardrobe { count: u64, required: u64 },

    #[error("No viable alternatives exist with the current wardrobe items")]
    NoAlternatives,

    #[error("Generated outfit has an invalid size: {count} items")]
    InvalidOutfitSize { count: usize },

    #[error("Failed to generate outfit")]
    GenerationFailed { retryable: bool },

    #[error("Could not assemble the recommended outfit: {message}")]
    RecommendationAssembly { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Combination {id} is deleted and cannot be modified")]
    InactiveCombination { id: String },

    // Conflict errors
    #[error("Item '{name}' is already part of the combination")]
    DuplicateItem { name: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Recommendation provider error: {message}")]
    RecommendationError { message: String },

    #[error("Image store error: {message}")]
    ImageError { message: String },

    #[error("Cache error: {message}")]
    CacheError { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InsufficientWardrobe { .. } => ErrorCode::InsufficientItems,
            AppError::NoAlternatives => ErrorCode::NoAlternatives,
            AppError::InvalidOutfitSize { .. } => ErrorCode::InvalidOutfitSize,
            AppError::GenerationFailed { .. } => ErrorCode::GenerationFailed,
            AppError::RecommendationAssembly { .. } => ErrorCode::RecommendationAssembly,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::InactiveCombination { .. } => ErrorCode::InactiveCombination,
            AppError::DuplicateItem { .. } => ErrorCode::DuplicateItem,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::RecommendationError { .. } => ErrorCode::RecommendationError,
            AppError::ImageError { .. } => ErrorCode::ImageError,
            AppError::CacheError { .. } => ErrorCode::CacheError,
            AppError::HttpClient(_) => ErrorCode::RecommendationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Check if this error is attributable to the caller's input or state
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::InsufficientWardrobe { .. }
                | AppError::NoAlternatives
                | AppError::NotFound { .. }
                | AppError::InactiveCombination { .. }
                | AppError::DuplicateItem { .. }
        )
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Check if the failed operation is worth retrying as-is
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::GenerationFailed { retryable: true }
                | AppError::RecommendationAssembly { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError {
            message: err.to_string(),
        }
    }
}
