//! Vestia Common Library
//!
//! Shared code for the Vestia combination engine including:
//! - Database models and repository patterns
//! - Recommendation-client abstraction
//! - Image store abstraction
//! - Cache backend for generation sessions
//! - Error types and handling
//! - Configuration management
//! - Metrics helpers

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod images;
pub mod metrics;
pub mod recommend;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{CombinationStore, Repository, WardrobeReader};
pub use errors::{AppError, Result};
pub use images::ImageResolver;
pub use recommend::Recommender;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
