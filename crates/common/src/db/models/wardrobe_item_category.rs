//! Wardrobe item / category join entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wardrobe_item_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub wardrobe_item_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wardrobe_item::Entity",
        from = "Column::WardrobeItemId",
        to = "super::wardrobe_item::Column::Id"
    )]
    WardrobeItem,

    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::wardrobe_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WardrobeItem.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
