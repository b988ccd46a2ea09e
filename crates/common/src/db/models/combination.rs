//! Combination entity
//!
//! A saved outfit. Combinations are never hard-deleted; `status` flips
//! between `active` and `deleted` and membership rows keep their own
//! independent lifecycle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Combination status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationStatus {
    Active,
    Deleted,
}

impl CombinationStatus {
    /// The opposite status (toggle operation)
    pub fn toggled(self) -> Self {
        match self {
            CombinationStatus::Active => CombinationStatus::Deleted,
            CombinationStatus::Deleted => CombinationStatus::Active,
        }
    }
}

impl From<String> for CombinationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "deleted" => CombinationStatus::Deleted,
            _ => CombinationStatus::Active,
        }
    }
}

impl From<CombinationStatus> for String {
    fn from(status: CombinationStatus) -> Self {
        match status {
            CombinationStatus::Active => "active".to_string(),
            CombinationStatus::Deleted => "deleted".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combinations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Ordered list of occasion labels as JSONB
    #[sea_orm(column_type = "JsonBinary")]
    pub occasions: Json,

    pub is_ai_generated: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub ai_explanation: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the status as an enum
    pub fn combination_status(&self) -> CombinationStatus {
        CombinationStatus::from(self.status.clone())
    }

    /// Whether the combination accepts membership changes
    pub fn is_active(&self) -> bool {
        self.combination_status() == CombinationStatus::Active
    }

    /// Occasion labels in their stored order
    pub fn occasion_list(&self) -> Vec<String> {
        self.occasions
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The occasion a generation session is tied to (first label)
    pub fn primary_occasion(&self) -> Option<String> {
        self.occasion_list().into_iter().next()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::combination_item::Entity")]
    CombinationItem,
}

impl Related<super::combination_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CombinationItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(
            CombinationStatus::from(String::from(CombinationStatus::Deleted)),
            CombinationStatus::Deleted
        );
        assert_eq!(CombinationStatus::Active.toggled(), CombinationStatus::Deleted);
        assert_eq!(CombinationStatus::Deleted.toggled(), CombinationStatus::Active);
    }

    #[test]
    fn test_occasion_helpers() {
        let model = Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Office".into(),
            description: None,
            occasions: serde_json::json!(["Casual Friday", "Work"]),
            is_ai_generated: true,
            ai_explanation: None,
            status: "active".into(),
            created_at: chrono::Utc::now().into(),
        };

        assert_eq!(model.occasion_list(), vec!["Casual Friday", "Work"]);
        assert_eq!(model.primary_occasion().as_deref(), Some("Casual Friday"));
        assert!(model.is_active());
    }
}
