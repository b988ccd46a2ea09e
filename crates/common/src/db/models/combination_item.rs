//! Combination membership entity
//!
//! The edge linking one wardrobe item to one combination. Membership is a
//! tri-state per (combination_id, wardrobe_item_id): absent (no row), active,
//! or inactive. The table carries a uniqueness constraint on the pair, so at
//! most one row exists for it; removing an item flips the row to inactive
//! rather than deleting it, and never touches the item itself.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Inactive,
}

impl MembershipStatus {
    /// The opposite status (toggle operation)
    pub fn toggled(self) -> Self {
        match self {
            MembershipStatus::Active => MembershipStatus::Inactive,
            MembershipStatus::Inactive => MembershipStatus::Active,
        }
    }
}

impl From<String> for MembershipStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "inactive" => MembershipStatus::Inactive,
            _ => MembershipStatus::Active,
        }
    }
}

impl From<MembershipStatus> for String {
    fn from(status: MembershipStatus) -> Self {
        match status {
            MembershipStatus::Active => "active".to_string(),
            MembershipStatus::Inactive => "inactive".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combination_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub combination_id: Uuid,

    pub wardrobe_item_id: Uuid,

    /// Per-membership explanation from the generator, if any
    #[sea_orm(column_type = "Text", nullable)]
    pub explanation: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the membership status as an enum
    pub fn membership_status(&self) -> MembershipStatus {
        MembershipStatus::from(self.status.clone())
    }

    /// Whether the membership is currently part of the combination
    pub fn is_active(&self) -> bool {
        self.membership_status() == MembershipStatus::Active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::combination::Entity",
        from = "Column::CombinationId",
        to = "super::combination::Column::Id"
    )]
    Combination,

    #[sea_orm(
        belongs_to = "super::wardrobe_item::Entity",
        from = "Column::WardrobeItemId",
        to = "super::wardrobe_item::Column::Id"
    )]
    WardrobeItem,
}

impl Related<super::combination::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Combination.def()
    }
}

impl Related<super::wardrobe_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WardrobeItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
