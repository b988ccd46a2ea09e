//! Generation session store
//!
//! Short-lived, cache-resident memory of previously generated outfits per
//! (user, occasion), used to honor "give me something different" requests.
//! Sessions are created lazily, refreshed with a full TTL on every update,
//! deleted when the user saves a combination for the occasion, and otherwise
//! left to expire in the cache backend.
//!
//! `get_or_create` followed by `update` is two independent cache operations;
//! concurrent quick generations for the same (user, occasion) can race and
//! the later write wins. The dedup history is advisory, so the lost update is
//! accepted rather than locked away.

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use vestia_common::cache::{self, keys, CacheBackend};
use vestia_common::errors::Result;
use vestia_common::metrics;

/// One previously generated outfit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousOutfit {
    pub item_ids: Vec<Uuid>,
    pub generated_at: DateTime<Utc>,
}

/// Cache-resident generation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    pub user_id: Uuid,
    pub occasion: String,
    pub previous_outfits: Vec<PreviousOutfit>,
    pub created_at: DateTime<Utc>,
}

impl GenerationSession {
    /// Union of item ids across all prior outfits
    pub fn all_item_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .previous_outfits
            .iter()
            .flat_map(|o| o.item_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Normalize an occasion label into a stable session key component.
///
/// Lower-cases, trims, and strips non-word characters so that caller casing
/// and punctuation never split one logical occasion across sessions. The
/// transformation is idempotent.
pub fn normalize_occasion(occasion: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").expect("static pattern"));

    non_word
        .replace_all(&occasion.to_lowercase(), "")
        .trim()
        .to_string()
}

/// TTL-backed store of generation sessions over an injected cache backend
pub struct GenerationSessionStore {
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl GenerationSessionStore {
    /// Create a store with the given backend and session TTL
    pub fn new(cache: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(user_id: Uuid, occasion: &str) -> String {
        keys::generation_session(user_id, &normalize_occasion(occasion))
    }

    /// Fetch the session for (user, occasion), creating an empty one if the
    /// cache has none
    pub async fn get_or_create(&self, user_id: Uuid, occasion: &str) -> Result<GenerationSession> {
        let key = Self::key(user_id, occasion);

        if let Some(session) = cache::get_json::<GenerationSession>(&*self.cache, &key).await? {
            metrics::record_session_cache(true);
            return Ok(session);
        }

        metrics::record_session_cache(false);

        let session = GenerationSession {
            user_id,
            occasion: normalize_occasion(occasion),
            previous_outfits: Vec::new(),
            created_at: Utc::now(),
        };

        cache::set_json(&*self.cache, &key, &session, self.ttl).await?;
        debug!(user_id = %user_id, occasion = %session.occasion, "Generation session created");

        Ok(session)
    }

    /// Append an outfit to the session and refresh its TTL.
    ///
    /// A missing or expired session makes this a no-op; the next
    /// `get_or_create` starts fresh.
    pub async fn update(&self, user_id: Uuid, occasion: &str, item_ids: Vec<Uuid>) -> Result<()> {
        let key = Self::key(user_id, occasion);

        let Some(mut session) = cache::get_json::<GenerationSession>(&*self.cache, &key).await?
        else {
            return Ok(());
        };

        session.previous_outfits.push(PreviousOutfit {
            item_ids,
            generated_at: Utc::now(),
        });

        cache::set_json(&*self.cache, &key, &session, self.ttl).await?;
        debug!(
            user_id = %user_id,
            occasion = %session.occasion,
            outfits = session.previous_outfits.len(),
            "Generation session updated"
        );

        Ok(())
    }

    /// Drop the session for (user, occasion)
    pub async fn delete(&self, user_id: Uuid, occasion: &str) -> Result<()> {
        let key = Self::key(user_id, occasion);
        let deleted = self.cache.delete(&key).await?;
        debug!(user_id = %user_id, key = %key, deleted, "Generation session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestia_common::cache::InMemoryCache;

    fn store() -> GenerationSessionStore {
        GenerationSessionStore::new(Arc::new(InMemoryCache::new()), Duration::from_secs(3600))
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["Casual Friday", "  BRUNCH!! ", "date-night", "café night"] {
            let once = normalize_occasion(raw);
            assert_eq!(normalize_occasion(&once), once);
        }
    }

    #[test]
    fn test_normalize_collapses_variants() {
        assert_eq!(
            normalize_occasion("Casual Friday"),
            normalize_occasion("casual friday!!")
        );
        assert_eq!(
            normalize_occasion("  Casual Friday  "),
            normalize_occasion("casual friday")
        );
        assert_ne!(
            normalize_occasion("casual friday"),
            normalize_occasion("formal friday")
        );
    }

    #[tokio::test]
    async fn test_get_or_create_returns_empty_session() {
        let store = store();
        let user_id = Uuid::new_v4();

        let session = store.get_or_create(user_id, "Brunch").await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.occasion, "brunch");
        assert!(session.previous_outfits.is_empty());
    }

    #[tokio::test]
    async fn test_update_appends_and_is_visible_across_casing() {
        let store = store();
        let user_id = Uuid::new_v4();
        let outfit: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        store.get_or_create(user_id, "Casual Friday").await.unwrap();
        store
            .update(user_id, "casual friday!", outfit.clone())
            .await
            .unwrap();

        let session = store.get_or_create(user_id, "CASUAL FRIDAY").await.unwrap();
        assert_eq!(session.previous_outfits.len(), 1);
        assert_eq!(session.previous_outfits[0].item_ids, outfit);
        assert_eq!(session.all_item_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_update_without_session_is_noop() {
        let store = store();
        let user_id = Uuid::new_v4();

        store
            .update(user_id, "brunch", vec![Uuid::new_v4()])
            .await
            .unwrap();

        let session = store.get_or_create(user_id, "brunch").await.unwrap();
        assert!(session.previous_outfits.is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_history() {
        let store = store();
        let user_id = Uuid::new_v4();

        store.get_or_create(user_id, "brunch").await.unwrap();
        store
            .update(user_id, "brunch", vec![Uuid::new_v4()])
            .await
            .unwrap();
        store.delete(user_id, "Brunch!").await.unwrap();

        let session = store.get_or_create(user_id, "brunch").await.unwrap();
        assert!(session.previous_outfits.is_empty());
    }

    #[tokio::test]
    async fn test_all_item_ids_dedupes_across_outfits() {
        let shared = Uuid::new_v4();
        let session = GenerationSession {
            user_id: Uuid::new_v4(),
            occasion: "brunch".into(),
            previous_outfits: vec![
                PreviousOutfit {
                    item_ids: vec![shared, Uuid::new_v4()],
                    generated_at: Utc::now(),
                },
                PreviousOutfit {
                    item_ids: vec![shared, Uuid::new_v4()],
                    generated_at: Utc::now(),
                },
            ],
            created_at: Utc::now(),
        };

        assert_eq!(session.all_item_ids().len(), 3);
    }
}
