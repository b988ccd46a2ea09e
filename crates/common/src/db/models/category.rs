//! Category entity (owned externally)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wardrobe_item_category::Entity")]
    WardrobeItemCategory,
}

impl Related<super::wardrobe_item_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WardrobeItemCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
