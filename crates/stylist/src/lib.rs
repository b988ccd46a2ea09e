//! Vestia Stylist
//!
//! The outfit-combination generation and lifecycle engine:
//! - Prompt construction for guided and quick generation
//! - Generation sessions for "give me something different" requests
//! - Bounded fixed-delay retry around the recommendation provider
//! - The combination generator orchestrating validation, recommendation,
//!   and concurrent item/image resolution
//! - The `CombinationsService` surface consumed by the application

pub mod generator;
pub mod prompt;
pub mod retry;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use generator::{CombinationGenerator, GeneratedCombination, OutfitItem, QuickGeneration};
pub use retry::RetryPolicy;
pub use service::CombinationsService;
pub use session::{normalize_occasion, GenerationSession, GenerationSessionStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
