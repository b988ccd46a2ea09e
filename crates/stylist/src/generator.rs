//! Combination generator
//!
//! Orchestrates AI-assisted outfit generation: precondition checks, prompt
//! construction, the recommendation call (with bounded retry in quick mode),
//! response validation, and ordered concurrent resolution of item detail and
//! image URLs. Session bookkeeping happens last so a failed generation never
//! pollutes the dedup history.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;
use vestia_common::config::GenerationConfig;
use vestia_common::db::WardrobeReader;
use vestia_common::errors::{AppError, Result};
use vestia_common::images::ImageResolver;
use vestia_common::metrics;
use vestia_common::recommend::Recommender;

use crate::prompt;
use crate::retry::RetryPolicy;
use crate::session::GenerationSessionStore;

/// One resolved image of an outfit item
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedImage {
    pub id: Uuid,
    pub url: String,
}

/// One item of a generated outfit, with display URLs resolved
#[derive(Debug, Clone, Serialize)]
pub struct OutfitItem {
    pub id: Uuid,
    pub name: String,
    pub primary_color: String,
    pub secondary_color: Option<String>,
    pub images: Vec<ResolvedImage>,
}

/// Result of a guided generation
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCombination {
    pub items: Vec<OutfitItem>,
    pub explanation: String,
}

/// Result of a quick generation
#[derive(Debug, Clone, Serialize)]
pub struct QuickGeneration {
    pub outfit: Vec<OutfitItem>,
    pub explanation: String,
    pub occasion: String,
    pub item_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Quick-mode model output: a flat list of item ids
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuickRecommendation {
    outfit_recommendation: Vec<Uuid>,
    overall_explanation: String,
}

/// Guided-mode model output: recommended items as `{id}` objects
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuidedRecommendation {
    outfit_recommendation: Vec<IdRef>,
    overall_explanation: String,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: Uuid,
}

/// Deduplicate while preserving first-occurrence order
fn dedup_ordered(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// AI outfit generation orchestrator
pub struct CombinationGenerator {
    wardrobe: Arc<dyn WardrobeReader>,
    recommender: Arc<dyn Recommender>,
    images: Arc<dyn ImageResolver>,
    sessions: Arc<GenerationSessionStore>,
    config: GenerationConfig,
    retry: RetryPolicy,
}

impl CombinationGenerator {
    pub fn new(
        wardrobe: Arc<dyn WardrobeReader>,
        recommender: Arc<dyn Recommender>,
        images: Arc<dyn ImageResolver>,
        sessions: Arc<GenerationSessionStore>,
        config: GenerationConfig,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry_max_attempts, config.retry_delay());
        Self {
            wardrobe,
            recommender,
            images,
            sessions,
            config,
            retry,
        }
    }

    // ========================================================================
    // Guided generation
    // ========================================================================

    /// Generate an outfit around explicitly chosen base items and category
    /// constraints. The recommendation call is made once; a model id that
    /// does not resolve is a transient condition reported as
    /// `RecommendationAssembly`.
    pub async fn generate_combinations(
        &self,
        user_id: Uuid,
        base_item_ids: &[Uuid],
        category_ids: &[Uuid],
        occasions: &[String],
        description: Option<&str>,
    ) -> Result<GeneratedCombination> {
        let started = Instant::now();
        let result = self
            .guided_inner(user_id, base_item_ids, category_ids, occasions, description)
            .await;
        metrics::record_generation(started.elapsed().as_secs_f64(), "guided", result.is_ok());
        result
    }

    async fn guided_inner(
        &self,
        user_id: Uuid,
        base_item_ids: &[Uuid],
        category_ids: &[Uuid],
        occasions: &[String],
        description: Option<&str>,
    ) -> Result<GeneratedCombination> {
        let base_items = self.wardrobe.find_items_by_ids(base_item_ids).await?;
        let candidates = self
            .wardrobe
            .find_items_by_categories(user_id, category_ids)
            .await?;
        let categories = self.wardrobe.find_categories_by_ids(category_ids).await?;

        let prompt = prompt::build_guided_prompt(
            &base_items,
            &candidates,
            &categories,
            occasions,
            description,
        );
        let schema = prompt::guided_output_schema();

        let response = self
            .recommender
            .generate(&prompt, &schema)
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Guided recommendation failed");
            })?;

        let recommendation: GuidedRecommendation =
            serde_json::from_value(response).map_err(|e| AppError::RecommendationError {
                message: format!("Model output did not match the guided schema: {}", e),
            })?;

        let ids = dedup_ordered(
            recommendation
                .outfit_recommendation
                .into_iter()
                .map(|r| r.id)
                .collect(),
        );

        let items = self.assemble_outfit(&ids).await?;

        info!(
            user_id = %user_id,
            items = items.len(),
            "Guided combination generated"
        );

        Ok(GeneratedCombination {
            items,
            explanation: recommendation.overall_explanation,
        })
    }

    // ========================================================================
    // Quick generation
    // ========================================================================

    /// Generate an outfit for a stated occasion without user-chosen base
    /// items. Honors the per-(user, occasion) session so an alternative
    /// request never repeats previously suggested items.
    pub async fn generate_quick_combination(
        &self,
        user_id: Uuid,
        occasion: &str,
        request_alternative: bool,
    ) -> Result<QuickGeneration> {
        let started = Instant::now();
        let result = self
            .quick_inner(user_id, occasion, request_alternative)
            .await;
        metrics::record_generation(started.elapsed().as_secs_f64(), "quick", result.is_ok());
        result
    }

    async fn quick_inner(
        &self,
        user_id: Uuid,
        occasion: &str,
        request_alternative: bool,
    ) -> Result<QuickGeneration> {
        // 1. Validate minimum wardrobe size
        let count = self.wardrobe.count_active_items(user_id).await?;
        if count < self.config.min_wardrobe_items {
            return Err(AppError::InsufficientWardrobe {
                count,
                required: self.config.min_wardrobe_items,
            });
        }

        // 2. Retrieve or create the generation session
        let session = self.sessions.get_or_create(user_id, occasion).await?;

        // 3. Exclusions only apply when the caller asked for an alternative
        let excluded = if request_alternative {
            session.all_item_ids()
        } else {
            Vec::new()
        };

        // 4. Fetch eligible items; a pool smaller than the minimum outfit
        //    size cannot yield a valid alternative
        let eligible = self.wardrobe.find_eligible_items(user_id, &excluded).await?;
        if eligible.len() < self.config.min_outfit_size {
            return Err(AppError::NoAlternatives);
        }

        // 5. Call the model, absorbing exactly one failure
        let prompt = prompt::build_quick_prompt(&eligible, occasion, &excluded);
        let schema = prompt::quick_output_schema();

        let recommendation = self
            .retry
            .run(|_attempt| {
                let prompt = prompt.clone();
                let schema = schema.clone();
                async move {
                    let response = self.recommender.generate(&prompt, &schema).await?;
                    serde_json::from_value::<QuickRecommendation>(response).map_err(|e| {
                        AppError::RecommendationError {
                            message: format!("Model output did not match the quick schema: {}", e),
                        }
                    })
                }
            })
            .await
            .map_err(|e| {
                error!(user_id = %user_id, occasion = %occasion, error = %e, "Quick generation failed after retry");
                AppError::GenerationFailed { retryable: true }
            })?;

        // 6. Validate the outfit size
        let item_ids = dedup_ordered(recommendation.outfit_recommendation);
        if item_ids.len() < self.config.min_outfit_size
            || item_ids.len() > self.config.max_outfit_size
        {
            warn!(
                user_id = %user_id,
                count = item_ids.len(),
                "Model returned an outfit outside the allowed size"
            );
            return Err(AppError::InvalidOutfitSize {
                count: item_ids.len(),
            });
        }

        // 7. Resolve item detail and images
        let outfit = self.assemble_outfit(&item_ids).await?;

        // 8. Record the outfit and refresh the session TTL
        self.sessions.update(user_id, occasion, item_ids).await?;

        info!(
            user_id = %user_id,
            occasion = %occasion,
            items = outfit.len(),
            alternative = request_alternative,
            "Quick combination generated"
        );

        // 9. Assemble the response
        Ok(QuickGeneration {
            item_count: outfit.len(),
            outfit,
            explanation: recommendation.overall_explanation,
            occasion: occasion.to_string(),
            generated_at: Utc::now(),
        })
    }

    // ========================================================================
    // Outfit assembly
    // ========================================================================

    /// Load display detail for the recommended ids and resolve every active
    /// image concurrently. Result order follows the recommendation order; a
    /// single failed resolution fails the whole outfit.
    async fn assemble_outfit(&self, item_ids: &[Uuid]) -> Result<Vec<OutfitItem>> {
        let details = self.wardrobe.find_outfit_details(item_ids).await?;

        if details.len() != item_ids.len() {
            let resolved: std::collections::HashSet<Uuid> =
                details.iter().map(|d| d.id).collect();
            let missing = item_ids
                .iter()
                .find(|id| !resolved.contains(*id))
                .copied()
                .unwrap_or_default();

            warn!(missing = %missing, "Recommended item does not exist");
            return Err(AppError::RecommendationAssembly {
                message: format!("Recommended item {} could not be resolved", missing),
            });
        }

        try_join_all(details.into_iter().map(|detail| {
            let images = Arc::clone(&self.images);
            async move {
                let resolved = try_join_all(detail.image_ids.iter().map(|image_id| {
                    let images = Arc::clone(&images);
                    let image_id = *image_id;
                    async move {
                        images.resolve(image_id).await.map(|url| ResolvedImage {
                            id: image_id,
                            url,
                        })
                    }
                }))
                .await
                .inspect_err(|e| {
                    error!(item_id = %detail.id, error = %e, "Image resolution failed");
                })?;

                Ok(OutfitItem {
                    id: detail.id,
                    name: detail.name,
                    primary_color: detail.primary_color,
                    secondary_color: detail.secondary_color,
                    images: resolved,
                })
            }
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use vestia_common::cache::InMemoryCache;
    use vestia_common::db::{CategorySummary, OutfitItemDetail, WardrobeItemDetail};
    use vestia_common::images::MockImageResolver;
    use vestia_common::recommend::{MockOutcome, MockRecommender};

    /// Wardrobe read model backed by fixture data
    struct MockWardrobe {
        items: Vec<WardrobeItemDetail>,
        images: HashMap<Uuid, Vec<Uuid>>,
        categories: Vec<CategorySummary>,
        recorded_excludes: Mutex<Vec<Vec<Uuid>>>,
    }

    impl MockWardrobe {
        fn new(items: Vec<WardrobeItemDetail>) -> Self {
            let images = items
                .iter()
                .map(|i| (i.id, vec![Uuid::new_v4()]))
                .collect();
            Self {
                items,
                images,
                categories: Vec::new(),
                recorded_excludes: Mutex::new(Vec::new()),
            }
        }

        fn with_categories(mut self, categories: Vec<CategorySummary>) -> Self {
            self.categories = categories;
            self
        }

        async fn last_exclude_set(&self) -> Option<Vec<Uuid>> {
            self.recorded_excludes.lock().await.last().cloned()
        }
    }

    #[async_trait]
    impl WardrobeReader for MockWardrobe {
        async fn count_active_items(&self, _user_id: Uuid) -> vestia_common::Result<u64> {
            Ok(self.items.len() as u64)
        }

        async fn find_items_by_ids(
            &self,
            ids: &[Uuid],
        ) -> vestia_common::Result<Vec<WardrobeItemDetail>> {
            Ok(self
                .items
                .iter()
                .filter(|i| ids.contains(&i.id))
                .cloned()
                .collect())
        }

        async fn find_items_by_categories(
            &self,
            _user_id: Uuid,
            category_ids: &[Uuid],
        ) -> vestia_common::Result<Vec<WardrobeItemDetail>> {
            Ok(self
                .items
                .iter()
                .filter(|i| i.category_ids.iter().any(|c| category_ids.contains(c)))
                .cloned()
                .collect())
        }

        async fn find_eligible_items(
            &self,
            _user_id: Uuid,
            exclude: &[Uuid],
        ) -> vestia_common::Result<Vec<WardrobeItemDetail>> {
            self.recorded_excludes.lock().await.push(exclude.to_vec());
            Ok(self
                .items
                .iter()
                .filter(|i| !exclude.contains(&i.id))
                .cloned()
                .collect())
        }

        async fn find_outfit_details(
            &self,
            ids: &[Uuid],
        ) -> vestia_common::Result<Vec<OutfitItemDetail>> {
            let by_id: HashMap<Uuid, &WardrobeItemDetail> =
                self.items.iter().map(|i| (i.id, i)).collect();

            Ok(ids
                .iter()
                .filter_map(|id| by_id.get(id))
                .map(|item| OutfitItemDetail {
                    id: item.id,
                    name: item.name.clone(),
                    primary_color: item.primary_color.clone(),
                    secondary_color: item.secondary_color.clone(),
                    image_ids: self.images.get(&item.id).cloned().unwrap_or_default(),
                })
                .collect())
        }

        async fn find_categories_by_ids(
            &self,
            ids: &[Uuid],
        ) -> vestia_common::Result<Vec<CategorySummary>> {
            Ok(self
                .categories
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect())
        }
    }

    fn make_items(count: usize) -> Vec<WardrobeItemDetail> {
        (0..count)
            .map(|i| WardrobeItemDetail {
                id: Uuid::new_v4(),
                name: format!("Item {}", i),
                description: format!("Wardrobe item number {}", i),
                season: "All Seasons".to_string(),
                primary_color: "Blue".to_string(),
                secondary_color: (i % 2 == 0).then(|| "White".to_string()),
                style: "Casual".to_string(),
                material: "Cotton".to_string(),
                size: "M".to_string(),
                category_ids: vec![Uuid::new_v4()],
            })
            .collect()
    }

    fn quick_response(ids: &[Uuid]) -> serde_json::Value {
        json!({
            "outfitRecommendation": ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            "overallExplanation": "A cohesive casual look",
        })
    }

    fn guided_response(ids: &[Uuid]) -> serde_json::Value {
        json!({
            "outfitRecommendation": ids
                .iter()
                .map(|id| json!({"id": id.to_string()}))
                .collect::<Vec<_>>(),
            "overallExplanation": "Completes the base item nicely",
        })
    }

    struct Fixture {
        wardrobe: Arc<MockWardrobe>,
        sessions: Arc<GenerationSessionStore>,
        generator: CombinationGenerator,
    }

    fn fixture_with(
        items: Vec<WardrobeItemDetail>,
        outcomes: Vec<MockOutcome>,
        failing_images: bool,
    ) -> Fixture {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let wardrobe = Arc::new(MockWardrobe::new(items));
        let sessions = Arc::new(GenerationSessionStore::new(
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(3600),
        ));
        let images: Arc<dyn ImageResolver> = if failing_images {
            Arc::new(MockImageResolver::failing())
        } else {
            Arc::new(MockImageResolver::new())
        };

        let generator = CombinationGenerator::new(
            wardrobe.clone(),
            Arc::new(MockRecommender::with_outcomes(outcomes)),
            images,
            sessions.clone(),
            GenerationConfig::default(),
        );

        Fixture {
            wardrobe,
            sessions,
            generator,
        }
    }

    fn fixture(items: Vec<WardrobeItemDetail>, outcomes: Vec<MockOutcome>) -> Fixture {
        fixture_with(items, outcomes, false)
    }

    #[tokio::test]
    async fn test_insufficient_wardrobe_fails_fast() {
        let fx = fixture(make_items(4), vec![]);
        let err = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::InsufficientWardrobe { count: 4, required: 5 }
        ));
    }

    #[tokio::test]
    async fn test_quick_generation_success() {
        let items = make_items(5);
        let chosen: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);
        let user_id = Uuid::new_v4();

        let result = fx
            .generator
            .generate_quick_combination(user_id, "Casual Friday", false)
            .await
            .unwrap();

        assert_eq!(result.item_count, 3);
        assert_eq!(result.occasion, "Casual Friday");
        assert!(result.item_count >= 3 && result.item_count <= 10);

        // Result preserves the recommendation order and resolves images
        let returned: Vec<Uuid> = result.outfit.iter().map(|i| i.id).collect();
        assert_eq!(returned, chosen);
        assert!(result.outfit.iter().all(|i| !i.images.is_empty()));
        assert!(result.outfit[0].images[0].url.starts_with("https://"));

        // The outfit was recorded in the session
        let session = fx.sessions.get_or_create(user_id, "casual friday").await.unwrap();
        assert_eq!(session.previous_outfits.len(), 1);
        assert_eq!(session.previous_outfits[0].item_ids, chosen);
    }

    #[tokio::test]
    async fn test_alternative_excludes_prior_outfits() {
        let items = make_items(6);
        let prior: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fresh: Vec<Uuid> = items.iter().skip(3).map(|i| i.id).collect();
        let fx = fixture(items, vec![Ok(quick_response(&fresh))]);
        let user_id = Uuid::new_v4();

        fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        fx.sessions
            .update(user_id, "brunch", prior.clone())
            .await
            .unwrap();

        let result = fx
            .generator
            .generate_quick_combination(user_id, "Brunch", true)
            .await
            .unwrap();

        // The eligible-item query saw exactly the prior ids as exclusions
        let mut expected = prior.clone();
        expected.sort_unstable();
        assert_eq!(fx.wardrobe.last_exclude_set().await.unwrap(), expected);

        // And the new outfit shares nothing with the prior one
        let returned: Vec<Uuid> = result.outfit.iter().map(|i| i.id).collect();
        assert!(returned.iter().all(|id| !prior.contains(id)));
    }

    #[tokio::test]
    async fn test_without_alternative_history_is_ignored() {
        let items = make_items(5);
        let chosen: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);
        let user_id = Uuid::new_v4();

        fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        fx.sessions
            .update(user_id, "brunch", chosen.clone())
            .await
            .unwrap();

        fx.generator
            .generate_quick_combination(user_id, "brunch", false)
            .await
            .unwrap();

        assert_eq!(fx.wardrobe.last_exclude_set().await.unwrap(), Vec::<Uuid>::new());
    }

    #[tokio::test]
    async fn test_no_alternatives_when_pool_below_minimum() {
        // Five items, three already suggested: the remaining two cannot form
        // a valid outfit
        let items = make_items(5);
        let prior: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fx = fixture(items, vec![]);
        let user_id = Uuid::new_v4();

        fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        fx.sessions.update(user_id, "brunch", prior).await.unwrap();

        let err = fx
            .generator
            .generate_quick_combination(user_id, "brunch", true)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoAlternatives));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_absorbs_single_failure() {
        let items = make_items(5);
        let chosen: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fx = fixture(
            items,
            vec![
                Err("model overloaded".to_string()),
                Ok(quick_response(&chosen)),
            ],
        );

        let result = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap();

        assert_eq!(result.item_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_surface_retryable_error() {
        let fx = fixture(
            make_items(5),
            vec![
                Err("model overloaded".to_string()),
                Err("still overloaded".to_string()),
            ],
        );

        let err = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationFailed { retryable: true }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_undersized_outfit_rejected() {
        let items = make_items(5);
        let chosen: Vec<Uuid> = items.iter().take(2).map(|i| i.id).collect();
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);

        let err = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidOutfitSize { count: 2 }));
    }

    #[tokio::test]
    async fn test_oversized_outfit_rejected() {
        let items = make_items(12);
        let chosen: Vec<Uuid> = items.iter().take(11).map(|i| i.id).collect();
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);

        let err = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidOutfitSize { count: 11 }));
    }

    #[tokio::test]
    async fn test_unknown_recommended_id_fails_assembly() {
        let items = make_items(5);
        let mut chosen: Vec<Uuid> = items.iter().take(2).map(|i| i.id).collect();
        chosen.push(Uuid::new_v4()); // id the wardrobe has never seen
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);

        let err = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RecommendationAssembly { .. }));
    }

    #[tokio::test]
    async fn test_image_failure_fails_generation_and_skips_session() {
        let items = make_items(5);
        let chosen: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        let fx = fixture_with(items, vec![Ok(quick_response(&chosen))], true);
        let user_id = Uuid::new_v4();

        let err = fx
            .generator
            .generate_quick_combination(user_id, "brunch", false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ImageError { .. }));

        // The failed outfit must not be recorded as "already suggested"
        let session = fx.sessions.get_or_create(user_id, "brunch").await.unwrap();
        assert!(session.previous_outfits.is_empty());
    }

    #[tokio::test]
    async fn test_guided_generation_success() {
        let category = CategorySummary {
            id: Uuid::new_v4(),
            name: "Bottoms".to_string(),
        };
        let mut items = make_items(4);
        for item in &mut items {
            item.category_ids = vec![category.id];
        }
        let base_id = items[0].id;
        let chosen: Vec<Uuid> = items.iter().skip(1).map(|i| i.id).collect();

        let wardrobe =
            Arc::new(MockWardrobe::new(items).with_categories(vec![category.clone()]));
        let sessions = Arc::new(GenerationSessionStore::new(
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(3600),
        ));
        let generator = CombinationGenerator::new(
            wardrobe,
            Arc::new(MockRecommender::with_responses(vec![guided_response(
                &chosen,
            )])),
            Arc::new(MockImageResolver::new()),
            sessions,
            GenerationConfig::default(),
        );

        let result = generator
            .generate_combinations(
                Uuid::new_v4(),
                &[base_id],
                &[category.id],
                &["Office".to_string()],
                Some("Business casual"),
            )
            .await
            .unwrap();

        let returned: Vec<Uuid> = result.items.iter().map(|i| i.id).collect();
        assert_eq!(returned, chosen);
        assert!(!result.explanation.is_empty());
    }

    #[tokio::test]
    async fn test_guided_generation_does_not_retry() {
        let recommender = Arc::new(MockRecommender::with_outcomes(vec![
            Err("model overloaded".to_string()),
            Ok(guided_response(&[Uuid::new_v4()])),
        ]));
        let generator = CombinationGenerator::new(
            Arc::new(MockWardrobe::new(make_items(5))),
            recommender.clone(),
            Arc::new(MockImageResolver::new()),
            Arc::new(GenerationSessionStore::new(
                Arc::new(InMemoryCache::new()),
                Duration::from_secs(3600),
            )),
            GenerationConfig::default(),
        );

        let err = generator
            .generate_combinations(Uuid::new_v4(), &[], &[], &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RecommendationError { .. }));
        assert_eq!(recommender.recorded_prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_recommended_ids_collapse() {
        let items = make_items(5);
        let mut chosen: Vec<Uuid> = items.iter().take(3).map(|i| i.id).collect();
        chosen.push(chosen[0]); // model repeated itself
        let fx = fixture(items, vec![Ok(quick_response(&chosen))]);

        let result = fx
            .generator
            .generate_quick_combination(Uuid::new_v4(), "brunch", false)
            .await
            .unwrap();

        assert_eq!(result.item_count, 3);
    }
}
