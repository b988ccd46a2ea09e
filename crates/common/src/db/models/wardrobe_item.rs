//! Wardrobe item entity (read-only to the combination engine)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wardrobe_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub season: String,

    pub primary_color: String,

    pub secondary_color: Option<String>,

    pub style: String,

    pub material: String,

    pub size: String,

    /// Active flag; inactive items are invisible to generation
    pub status: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_image::Entity")]
    ItemImage,

    #[sea_orm(has_many = "super::wardrobe_item_category::Entity")]
    WardrobeItemCategory,

    #[sea_orm(has_many = "super::combination_item::Entity")]
    CombinationItem,
}

impl Related<super::item_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemImage.def()
    }
}

impl Related<super::wardrobe_item_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WardrobeItemCategory.def()
    }
}

impl Related<super::combination_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CombinationItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
