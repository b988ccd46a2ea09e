//! Repository pattern for database operations
//!
//! Carries the wardrobe read model consumed by the generation engine (behind
//! `WardrobeReader`) and the combination lifecycle owned by it (behind
//! `CombinationStore`), with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Full wardrobe item attribute set handed to the prompt builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardrobeItemDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub season: String,
    pub primary_color: String,
    pub secondary_color: Option<String>,
    pub style: String,
    pub material: String,
    pub size: String,
    pub category_ids: Vec<Uuid>,
}

/// Display-oriented item detail used when assembling a generated outfit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitItemDetail {
    pub id: Uuid,
    pub name: String,
    pub primary_color: String,
    pub secondary_color: Option<String>,
    pub image_ids: Vec<Uuid>,
}

/// Category id + name pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

/// Payload for creating a combination with its initial memberships
#[derive(Debug, Clone)]
pub struct NewCombination {
    pub name: String,
    pub description: Option<String>,
    pub occasions: Vec<String>,
    pub is_ai_generated: bool,
    pub ai_explanation: Option<String>,
    pub items: Vec<NewCombinationItem>,
}

/// One membership within a save/add request
#[derive(Debug, Clone)]
pub struct NewCombinationItem {
    pub wardrobe_item_id: Uuid,
    pub explanation: Option<String>,
}

/// Combination list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub occasions: Vec<String>,
    pub is_ai_generated: bool,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

/// One page of combinations plus the total count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationPage {
    pub combinations: Vec<CombinationSummary>,
    pub total: u64,
}

/// Combination with its active memberships fully resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub occasions: Vec<String>,
    pub is_ai_generated: bool,
    pub ai_explanation: Option<String>,
    pub status: CombinationStatus,
    pub items: Vec<CombinationItemDetail>,
}

/// One active membership with item detail and category names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationItemDetail {
    pub id: Uuid,
    pub explanation: Option<String>,
    pub item: WardrobeItemDetail,
    pub categories: Vec<CategorySummary>,
}

/// Wardrobe read model consumed by the generation engine.
///
/// Wardrobe items and categories are owned by the wardrobe subsystem; the
/// engine only reads them through this contract.
#[async_trait]
pub trait WardrobeReader: Send + Sync {
    /// Count the user's active wardrobe items
    async fn count_active_items(&self, user_id: Uuid) -> Result<u64>;

    /// Load full item detail for an explicit id set
    async fn find_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<WardrobeItemDetail>>;

    /// Load the user's active items belonging to any of the given categories
    async fn find_items_by_categories(
        &self,
        user_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<Vec<WardrobeItemDetail>>;

    /// Load the user's active items, excluding the given ids
    async fn find_eligible_items(
        &self,
        user_id: Uuid,
        exclude: &[Uuid],
    ) -> Result<Vec<WardrobeItemDetail>>;

    /// Load display detail (name, colors, active image ids) for an id set,
    /// preserving the input order; unknown ids are omitted
    async fn find_outfit_details(&self, ids: &[Uuid]) -> Result<Vec<OutfitItemDetail>>;

    /// Load categories by id
    async fn find_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CategorySummary>>;
}

/// Combination lifecycle contract exposed to the service surface
#[async_trait]
pub trait CombinationStore: Send + Sync {
    /// Create a combination plus its initial active memberships atomically
    async fn save_combination(&self, user_id: Uuid, data: NewCombination) -> Result<Combination>;

    /// List a user's combinations filtered by status, newest first
    async fn list_combinations(
        &self,
        user_id: Uuid,
        status: CombinationStatus,
        offset: u64,
        limit: u64,
    ) -> Result<CombinationPage>;

    /// Load a combination with its active memberships
    async fn get_combination_by_id(&self, id: Uuid) -> Result<CombinationDetail>;

    /// Toggle a combination between active and deleted; memberships are untouched
    async fn toggle_combination_status(&self, id: Uuid) -> Result<CombinationStatus>;

    /// Add items to an active combination, all-or-nothing
    async fn add_items_to_combination(
        &self,
        combination_id: Uuid,
        items: &[NewCombinationItem],
    ) -> Result<()>;

    /// Toggle a single membership between active and inactive
    async fn toggle_combination_item_status(
        &self,
        combination_id: Uuid,
        wardrobe_item_id: Uuid,
    ) -> Result<MembershipStatus>;
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Map items to their category ids in one query
    async fn category_ids_for(&self, item_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = WardrobeItemCategoryEntity::find()
            .filter(WardrobeItemCategoryColumn::WardrobeItemId.is_in(item_ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            map.entry(row.wardrobe_item_id).or_default().push(row.category_id);
        }
        Ok(map)
    }

    /// Convert entity rows into details with categories attached
    async fn into_details(&self, items: Vec<WardrobeItem>) -> Result<Vec<WardrobeItemDetail>> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let mut categories = self.category_ids_for(&ids).await?;

        Ok(items
            .into_iter()
            .map(|item| WardrobeItemDetail {
                category_ids: categories.remove(&item.id).unwrap_or_default(),
                id: item.id,
                name: item.name,
                description: item.description,
                season: item.season,
                primary_color: item.primary_color,
                secondary_color: item.secondary_color,
                style: item.style,
                material: item.material,
                size: item.size,
            })
            .collect())
    }
}

// ============================================================================
// Wardrobe read model
// ============================================================================

#[async_trait]
impl WardrobeReader for Repository {
    async fn count_active_items(&self, user_id: Uuid) -> Result<u64> {
        WardrobeItemEntity::find()
            .filter(WardrobeItemColumn::UserId.eq(user_id))
            .filter(WardrobeItemColumn::Status.eq(true))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<WardrobeItemDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = WardrobeItemEntity::find()
            .filter(WardrobeItemColumn::Id.is_in(ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        self.into_details(items).await
    }

    async fn find_items_by_categories(
        &self,
        user_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<Vec<WardrobeItemDetail>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        let member_rows = WardrobeItemCategoryEntity::find()
            .filter(WardrobeItemCategoryColumn::CategoryId.is_in(category_ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        let mut item_ids: Vec<Uuid> = member_rows.into_iter().map(|r| r.wardrobe_item_id).collect();
        item_ids.sort_unstable();
        item_ids.dedup();

        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = WardrobeItemEntity::find()
            .filter(WardrobeItemColumn::Id.is_in(item_ids))
            .filter(WardrobeItemColumn::UserId.eq(user_id))
            .filter(WardrobeItemColumn::Status.eq(true))
            .all(self.read_conn())
            .await?;

        self.into_details(items).await
    }

    async fn find_eligible_items(
        &self,
        user_id: Uuid,
        exclude: &[Uuid],
    ) -> Result<Vec<WardrobeItemDetail>> {
        let mut query = WardrobeItemEntity::find()
            .filter(WardrobeItemColumn::UserId.eq(user_id))
            .filter(WardrobeItemColumn::Status.eq(true));

        if !exclude.is_empty() {
            query = query.filter(WardrobeItemColumn::Id.is_not_in(exclude.iter().copied()));
        }

        let items = query.all(self.read_conn()).await?;
        self.into_details(items).await
    }

    async fn find_outfit_details(&self, ids: &[Uuid]) -> Result<Vec<OutfitItemDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = WardrobeItemEntity::find()
            .filter(WardrobeItemColumn::Id.is_in(ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        let images = ItemImageEntity::find()
            .filter(ItemImageColumn::WardrobeItemId.is_in(ids.iter().copied()))
            .filter(ItemImageColumn::Status.eq(true))
            .all(self.read_conn())
            .await?;

        let mut image_map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for image in images {
            image_map.entry(image.wardrobe_item_id).or_default().push(image.id);
        }

        let mut by_id: HashMap<Uuid, WardrobeItem> =
            items.into_iter().map(|i| (i.id, i)).collect();

        // Preserve the caller's (recommendation) order
        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = by_id.remove(id) {
                details.push(OutfitItemDetail {
                    image_ids: image_map.remove(&item.id).unwrap_or_default(),
                    id: item.id,
                    name: item.name,
                    primary_color: item.primary_color,
                    secondary_color: item.secondary_color,
                });
            }
        }

        Ok(details)
    }

    async fn find_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CategorySummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let categories = CategoryEntity::find()
            .filter(CategoryColumn::Id.is_in(ids.iter().copied()))
            .all(self.read_conn())
            .await?;

        Ok(categories
            .into_iter()
            .map(|c| CategorySummary { id: c.id, name: c.name })
            .collect())
    }
}

// ============================================================================
// Combination lifecycle
// ============================================================================

#[async_trait]
impl CombinationStore for Repository {
    async fn save_combination(&self, user_id: Uuid, data: NewCombination) -> Result<Combination> {
        let combination_id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let item_count = data.items.len();

        // One atomic unit: a failed membership write rolls the whole save back
        let txn = self.write_conn().begin().await?;

        let combination = CombinationActiveModel {
            id: Set(combination_id),
            user_id: Set(user_id),
            name: Set(data.name),
            description: Set(data.description),
            occasions: Set(serde_json::json!(data.occasions)),
            is_ai_generated: Set(data.is_ai_generated),
            ai_explanation: Set(data.ai_explanation),
            status: Set(CombinationStatus::Active.into()),
            created_at: Set(now.into()),
        };

        let combination = combination.insert(&txn).await?;

        for item in data.items {
            let membership = CombinationItemActiveModel {
                id: Set(Uuid::new_v4()),
                combination_id: Set(combination_id),
                wardrobe_item_id: Set(item.wardrobe_item_id),
                explanation: Set(item.explanation),
                status: Set(MembershipStatus::Active.into()),
                created_at: Set(now.into()),
            };
            membership.insert(&txn).await?;
        }

        txn.commit().await?;

        tracing::info!(
            combination_id = %combination_id,
            user_id = %user_id,
            items = item_count,
            "Combination saved"
        );

        Ok(combination)
    }

    async fn list_combinations(
        &self,
        user_id: Uuid,
        status: CombinationStatus,
        offset: u64,
        limit: u64,
    ) -> Result<CombinationPage> {
        let paginator = CombinationEntity::find()
            .filter(CombinationColumn::UserId.eq(user_id))
            .filter(CombinationColumn::Status.eq(String::from(status)))
            .order_by_desc(CombinationColumn::CreatedAt)
            .paginate(self.read_conn(), limit.max(1));

        let total = paginator.num_items().await?;
        let combinations = paginator.fetch_page(offset / limit.max(1)).await?;

        if combinations.is_empty() {
            return Err(AppError::NotFound {
                resource_type: "combinations".to_string(),
                id: user_id.to_string(),
            });
        }

        let combinations = combinations
            .into_iter()
            .map(|c| CombinationSummary {
                occasions: c.occasion_list(),
                id: c.id,
                name: c.name,
                description: c.description,
                is_ai_generated: c.is_ai_generated,
                created_at: c.created_at,
            })
            .collect();

        Ok(CombinationPage { combinations, total })
    }

    async fn get_combination_by_id(&self, id: Uuid) -> Result<CombinationDetail> {
        let combination = CombinationEntity::find_by_id(id)
            .one(self.read_conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "combination".to_string(),
                id: id.to_string(),
            })?;

        let memberships = CombinationItemEntity::find()
            .filter(CombinationItemColumn::CombinationId.eq(id))
            .filter(CombinationItemColumn::Status.eq(String::from(MembershipStatus::Active)))
            .all(self.read_conn())
            .await?;

        let item_ids: Vec<Uuid> = memberships.iter().map(|m| m.wardrobe_item_id).collect();
        let item_details = self.find_items_by_ids(&item_ids).await?;

        let mut all_category_ids: Vec<Uuid> = item_details
            .iter()
            .flat_map(|i| i.category_ids.iter().copied())
            .collect();
        all_category_ids.sort_unstable();
        all_category_ids.dedup();

        let categories = self.find_categories_by_ids(&all_category_ids).await?;
        let category_map: HashMap<Uuid, CategorySummary> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        let mut details_by_id: HashMap<Uuid, WardrobeItemDetail> =
            item_details.into_iter().map(|i| (i.id, i)).collect();

        let items = memberships
            .into_iter()
            .filter_map(|membership| {
                let item = details_by_id.remove(&membership.wardrobe_item_id)?;
                let categories = item
                    .category_ids
                    .iter()
                    .filter_map(|cid| category_map.get(cid).cloned())
                    .collect();
                Some(CombinationItemDetail {
                    id: membership.id,
                    explanation: membership.explanation,
                    item,
                    categories,
                })
            })
            .collect();

        Ok(CombinationDetail {
            status: combination.combination_status(),
            occasions: combination.occasion_list(),
            id: combination.id,
            name: combination.name,
            description: combination.description,
            is_ai_generated: combination.is_ai_generated,
            ai_explanation: combination.ai_explanation,
            items,
        })
    }

    async fn toggle_combination_status(&self, id: Uuid) -> Result<CombinationStatus> {
        let combination = CombinationEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "combination".to_string(),
                id: id.to_string(),
            })?;

        let next = combination.combination_status().toggled();

        let mut active: CombinationActiveModel = combination.into();
        active.status = Set(String::from(next));
        active.update(self.write_conn()).await?;

        tracing::info!(combination_id = %id, status = ?next, "Combination status toggled");

        Ok(next)
    }

    async fn add_items_to_combination(
        &self,
        combination_id: Uuid,
        items: &[NewCombinationItem],
    ) -> Result<()> {
        let txn = self.write_conn().begin().await?;

        let combination = CombinationEntity::find_by_id(combination_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "combination".to_string(),
                id: combination_id.to_string(),
            })?;

        if !combination.is_active() {
            return Err(AppError::InactiveCombination {
                id: combination_id.to_string(),
            });
        }

        for item in items {
            // Atomic insert; the uniqueness constraint on
            // (combination_id, wardrobe_item_id) decides who wins a race
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO combination_items (
                    id, combination_id, wardrobe_item_id, explanation, status, created_at
                )
                VALUES ($1, $2, $3, $4, 'active', NOW())
                ON CONFLICT (combination_id, wardrobe_item_id) DO NOTHING
                "#,
                vec![
                    Uuid::new_v4().into(),
                    combination_id.into(),
                    item.wardrobe_item_id.into(),
                    item.explanation.clone().into(),
                ],
            );

            let inserted = txn.execute(stmt).await?;
            if inserted.rows_affected() > 0 {
                continue;
            }

            // The pair already has its single row: reactivate or reject
            let existing = CombinationItemEntity::find()
                .filter(CombinationItemColumn::CombinationId.eq(combination_id))
                .filter(CombinationItemColumn::WardrobeItemId.eq(item.wardrobe_item_id))
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Internal {
                    message: format!(
                        "Membership row for item {} vanished mid-transaction",
                        item.wardrobe_item_id
                    ),
                })?;

            if existing.is_active() {
                let name = WardrobeItemEntity::find_by_id(item.wardrobe_item_id)
                    .one(&txn)
                    .await?
                    .map(|i| i.name)
                    .unwrap_or_else(|| item.wardrobe_item_id.to_string());

                // Dropping the transaction rolls back any earlier reactivations
                return Err(AppError::DuplicateItem { name });
            }

            let mut active: CombinationItemActiveModel = existing.into();
            active.status = Set(MembershipStatus::Active.into());
            active.explanation = Set(item.explanation.clone());
            active.update(&txn).await?;
        }

        txn.commit().await?;

        tracing::info!(
            combination_id = %combination_id,
            items = items.len(),
            "Items added to combination"
        );

        Ok(())
    }

    async fn toggle_combination_item_status(
        &self,
        combination_id: Uuid,
        wardrobe_item_id: Uuid,
    ) -> Result<MembershipStatus> {
        let (membership, combination) = CombinationItemEntity::find()
            .filter(CombinationItemColumn::CombinationId.eq(combination_id))
            .filter(CombinationItemColumn::WardrobeItemId.eq(wardrobe_item_id))
            .find_also_related(combination::Entity)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "combination item".to_string(),
                id: wardrobe_item_id.to_string(),
            })?;

        let combination = combination.ok_or_else(|| AppError::NotFound {
            resource_type: "combination".to_string(),
            id: combination_id.to_string(),
        })?;

        if !combination.is_active() {
            return Err(AppError::InactiveCombination {
                id: combination_id.to_string(),
            });
        }

        let next = membership.membership_status().toggled();

        let mut active: CombinationItemActiveModel = membership.into();
        active.status = Set(String::from(next));
        active.update(self.write_conn()).await?;

        tracing::info!(
            combination_id = %combination_id,
            wardrobe_item_id = %wardrobe_item_id,
            status = ?next,
            "Membership status toggled"
        );

        Ok(next)
    }
}
