//! Combinations service
//!
//! The surface the rest of the application consumes: generation entry
//! points, combination persistence, and lifecycle toggles. Requests are
//! validated here before any work is delegated; saving a combination also
//! invalidates the generation session tied to its primary occasion.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use vestia_common::db::models::{CombinationStatus, MembershipStatus};
use vestia_common::db::{
    CombinationDetail, CombinationPage, CombinationStore, NewCombination, NewCombinationItem,
};
use vestia_common::errors::{AppError, Result};

use crate::generator::{CombinationGenerator, GeneratedCombination, QuickGeneration};
use crate::session::GenerationSessionStore;

/// Guided-generation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateCombinationRequest {
    pub base_item_ids: Vec<Uuid>,

    #[validate(length(min = 1, message = "at least one category is required"))]
    pub category_ids: Vec<Uuid>,

    #[serde(default)]
    pub occasions: Vec<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Quick-generation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuickGenerateRequest {
    #[validate(length(min = 1, max = 60))]
    pub occasion: String,

    #[serde(default)]
    pub request_alternative: bool,
}

/// Save-combination request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveCombinationRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    #[serde(default)]
    pub occasions: Vec<String>,

    #[serde(default)]
    pub is_ai_generated: bool,

    pub explanation: Option<String>,

    #[validate(length(min = 1, message = "a combination needs at least one item"))]
    pub combination_items: Vec<CombinationItemRequest>,
}

/// One membership within a save or add request
#[derive(Debug, Clone, Deserialize)]
pub struct CombinationItemRequest {
    pub wardrobe_item_id: Uuid,
    pub explanation: Option<String>,
}

/// Add-items request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddItemsRequest {
    pub combination_id: Uuid,

    #[validate(length(min = 1, message = "at least one item is required"))]
    pub combination_items: Vec<CombinationItemRequest>,
}

/// Pagination and status filter for listing combinations
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListCombinationsRequest {
    #[serde(default)]
    pub offset: u64,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,

    #[serde(default = "default_status_filter")]
    pub status: CombinationStatus,
}

fn default_limit() -> u64 {
    20
}

fn default_status_filter() -> CombinationStatus {
    CombinationStatus::Active
}

/// Response to a successful save
#[derive(Debug, Clone, Serialize)]
pub struct SaveCombinationResponse {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// The combination engine's exposed surface
pub struct CombinationsService {
    store: Arc<dyn CombinationStore>,
    sessions: Arc<GenerationSessionStore>,
    generator: CombinationGenerator,
}

impl CombinationsService {
    pub fn new(
        store: Arc<dyn CombinationStore>,
        sessions: Arc<GenerationSessionStore>,
        generator: CombinationGenerator,
    ) -> Self {
        Self {
            store,
            sessions,
            generator,
        }
    }

    /// Guided generation around user-chosen base items
    pub async fn generate_combination(
        &self,
        request: GenerateCombinationRequest,
        user_id: Uuid,
    ) -> Result<GeneratedCombination> {
        validate_request(&request)?;

        self.generator
            .generate_combinations(
                user_id,
                &request.base_item_ids,
                &request.category_ids,
                &request.occasions,
                request.description.as_deref(),
            )
            .await
    }

    /// Unattended generation for a stated occasion
    pub async fn generate_quick_combination(
        &self,
        request: QuickGenerateRequest,
        user_id: Uuid,
    ) -> Result<QuickGeneration> {
        validate_request(&request)?;

        self.generator
            .generate_quick_combination(user_id, &request.occasion, request.request_alternative)
            .await
    }

    /// Persist a combination with its initial memberships.
    ///
    /// Also drops the generation session for the primary occasion: once the
    /// user saved an outfit, the dedup history has served its purpose.
    pub async fn save_combination(
        &self,
        request: SaveCombinationRequest,
        user_id: Uuid,
    ) -> Result<SaveCombinationResponse> {
        validate_request(&request)?;

        let primary_occasion = request.occasions.first().cloned();

        let combination = self
            .store
            .save_combination(
                user_id,
                NewCombination {
                    name: request.name,
                    description: request.description,
                    occasions: request.occasions,
                    is_ai_generated: request.is_ai_generated,
                    ai_explanation: request.explanation,
                    items: request
                        .combination_items
                        .into_iter()
                        .map(|i| NewCombinationItem {
                            wardrobe_item_id: i.wardrobe_item_id,
                            explanation: i.explanation,
                        })
                        .collect(),
                },
            )
            .await?;

        if let Some(ref occasion) = primary_occasion {
            self.sessions.delete(user_id, occasion).await?;
            info!(
                combination_id = %combination.id,
                occasion = %occasion,
                "Generation session invalidated after save"
            );
        }

        Ok(SaveCombinationResponse {
            id: combination.id,
            created_at: combination.created_at,
        })
    }

    /// List the user's combinations, newest first
    pub async fn list_combinations(
        &self,
        request: ListCombinationsRequest,
        user_id: Uuid,
    ) -> Result<CombinationPage> {
        validate_request(&request)?;

        self.store
            .list_combinations(user_id, request.status, request.offset, request.limit)
            .await
    }

    /// Load one combination with its active memberships
    pub async fn get_combination_by_id(&self, combination_id: Uuid) -> Result<CombinationDetail> {
        self.store.get_combination_by_id(combination_id).await
    }

    /// Toggle a combination between active and deleted
    pub async fn toggle_combination_status(
        &self,
        combination_id: Uuid,
    ) -> Result<CombinationStatus> {
        self.store.toggle_combination_status(combination_id).await
    }

    /// Add items to an active combination, all-or-nothing
    pub async fn add_items_to_combination(&self, request: AddItemsRequest) -> Result<()> {
        validate_request(&request)?;

        let items: Vec<NewCombinationItem> = request
            .combination_items
            .into_iter()
            .map(|i| NewCombinationItem {
                wardrobe_item_id: i.wardrobe_item_id,
                explanation: i.explanation,
            })
            .collect();

        self.store
            .add_items_to_combination(request.combination_id, &items)
            .await
    }

    /// Toggle one membership between active and inactive
    pub async fn toggle_combination_item_status(
        &self,
        combination_id: Uuid,
        wardrobe_item_id: Uuid,
    ) -> Result<MembershipStatus> {
        self.store
            .toggle_combination_item_status(combination_id, wardrobe_item_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use vestia_common::cache::InMemoryCache;
    use vestia_common::config::GenerationConfig;
    use vestia_common::db::models::Combination;
    use vestia_common::db::{
        CategorySummary, OutfitItemDetail, WardrobeItemDetail, WardrobeReader,
    };
    use vestia_common::images::MockImageResolver;
    use vestia_common::recommend::MockRecommender;

    /// Store stub recording saves; lifecycle lookups report not-found
    #[derive(Default)]
    struct MockStore {
        saved: Mutex<Vec<NewCombination>>,
    }

    #[async_trait]
    impl CombinationStore for MockStore {
        async fn save_combination(
            &self,
            user_id: Uuid,
            data: NewCombination,
        ) -> Result<Combination> {
            let occasions = serde_json::json!(data.occasions.clone());
            self.saved.lock().await.push(data);

            Ok(Combination {
                id: Uuid::new_v4(),
                user_id,
                name: "saved".into(),
                description: None,
                occasions,
                is_ai_generated: true,
                ai_explanation: None,
                status: "active".into(),
                created_at: chrono::Utc::now().into(),
            })
        }

        async fn list_combinations(
            &self,
            user_id: Uuid,
            _status: CombinationStatus,
            _offset: u64,
            _limit: u64,
        ) -> Result<CombinationPage> {
            Err(AppError::NotFound {
                resource_type: "combinations".into(),
                id: user_id.to_string(),
            })
        }

        async fn get_combination_by_id(&self, id: Uuid) -> Result<CombinationDetail> {
            Err(AppError::NotFound {
                resource_type: "combination".into(),
                id: id.to_string(),
            })
        }

        async fn toggle_combination_status(&self, id: Uuid) -> Result<CombinationStatus> {
            Err(AppError::NotFound {
                resource_type: "combination".into(),
                id: id.to_string(),
            })
        }

        async fn add_items_to_combination(
            &self,
            _combination_id: Uuid,
            _items: &[NewCombinationItem],
        ) -> Result<()> {
            Ok(())
        }

        async fn toggle_combination_item_status(
            &self,
            _combination_id: Uuid,
            wardrobe_item_id: Uuid,
        ) -> Result<MembershipStatus> {
            Err(AppError::NotFound {
                resource_type: "combination item".into(),
                id: wardrobe_item_id.to_string(),
            })
        }
    }

    /// Wardrobe stub for wiring a generator the tests never exercise
    struct EmptyWardrobe;

    #[async_trait]
    impl WardrobeReader for EmptyWardrobe {
        async fn count_active_items(&self, _user_id: Uuid) -> Result<u64> {
            Ok(0)
        }

        async fn find_items_by_ids(&self, _ids: &[Uuid]) -> Result<Vec<WardrobeItemDetail>> {
            Ok(Vec::new())
        }

        async fn find_items_by_categories(
            &self,
            _user_id: Uuid,
            _category_ids: &[Uuid],
        ) -> Result<Vec<WardrobeItemDetail>> {
            Ok(Vec::new())
        }

        async fn find_eligible_items(
            &self,
            _user_id: Uuid,
            _exclude: &[Uuid],
        ) -> Result<Vec<WardrobeItemDetail>> {
            Ok(Vec::new())
        }

        async fn find_outfit_details(&self, _ids: &[Uuid]) -> Result<Vec<OutfitItemDetail>> {
            Ok(Vec::new())
        }

        async fn find_categories_by_ids(&self, _ids: &[Uuid]) -> Result<Vec<CategorySummary>> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        store: Arc<MockStore>,
        sessions: Arc<GenerationSessionStore>,
        service: CombinationsService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockStore::default());
        let sessions = Arc::new(GenerationSessionStore::new(
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(3600),
        ));
        let generator = CombinationGenerator::new(
            Arc::new(EmptyWardrobe),
            Arc::new(MockRecommender::with_responses(Vec::new())),
            Arc::new(MockImageResolver::new()),
            sessions.clone(),
            GenerationConfig::default(),
        );

        Fixture {
            service: CombinationsService::new(store.clone(), sessions.clone(), generator),
            store,
            sessions,
        }
    }

    fn save_request(occasions: Vec<&str>) -> SaveCombinationRequest {
        SaveCombinationRequest {
            name: "Friday look".into(),
            description: None,
            occasions: occasions.into_iter().map(String::from).collect(),
            is_ai_generated: true,
            explanation: Some("Generated look".into()),
            combination_items: vec![CombinationItemRequest {
                wardrobe_item_id: Uuid::new_v4(),
                explanation: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_save_clears_session_for_primary_occasion() {
        let fx = fixture();
        let user_id = Uuid::new_v4();

        // A prior quick generation left history behind
        fx.sessions
            .get_or_create(user_id, "Casual Friday")
            .await
            .unwrap();
        fx.sessions
            .update(user_id, "Casual Friday", vec![Uuid::new_v4()])
            .await
            .unwrap();

        fx.service
            .save_combination(save_request(vec!["Casual Friday"]), user_id)
            .await
            .unwrap();

        // The next generation for the same occasion starts from scratch,
        // however the caller spells it
        let session = fx
            .sessions
            .get_or_create(user_id, "casual friday!")
            .await
            .unwrap();
        assert!(session.previous_outfits.is_empty());
        assert_eq!(fx.store.saved.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_without_occasions_skips_session() {
        let fx = fixture();
        let user_id = Uuid::new_v4();

        fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        fx.sessions
            .update(user_id, "brunch", vec![Uuid::new_v4()])
            .await
            .unwrap();

        fx.service
            .save_combination(save_request(vec![]), user_id)
            .await
            .unwrap();

        // Unrelated session untouched
        let session = fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        assert_eq!(session.previous_outfits.len(), 1);
    }

    #[tokio::test]
    async fn test_save_validates_name_and_items() {
        let fx = fixture();
        let user_id = Uuid::new_v4();

        let mut request = save_request(vec![]);
        request.name = String::new();
        let err = fx.service.save_combination(request, user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut request = save_request(vec![]);
        request.combination_items.clear();
        let err = fx.service.save_combination(request, user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert!(fx.store.saved.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_quick_generate_validates_occasion() {
        let fx = fixture();

        let err = fx
            .service
            .generate_quick_combination(
                QuickGenerateRequest {
                    occasion: String::new(),
                    request_alternative: false,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_guided_generate_requires_categories() {
        let fx = fixture();

        let err = fx
            .service
            .generate_combination(
                GenerateCombinationRequest {
                    base_item_ids: vec![Uuid::new_v4()],
                    category_ids: vec![],
                    occasions: vec![],
                    description: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_add_items_requires_items() {
        let fx = fixture();

        let err = fx
            .service
            .add_items_to_combination(AddItemsRequest {
                combination_id: Uuid::new_v4(),
                combination_items: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_limit_bounds() {
        let fx = fixture();

        let err = fx
            .service
            .list_combinations(
                ListCombinationsRequest {
                    offset: 0,
                    limit: 0,
                    status: CombinationStatus::Active,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }
}
