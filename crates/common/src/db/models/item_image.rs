//! Item image metadata entity
//!
//! Only the metadata lives here; binaries are held by the external image
//! store and resolved to URLs through `images::ImageResolver`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub wardrobe_item_id: Uuid,

    /// Active flag; inactive images are not resolved into outfits
    pub status: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wardrobe_item::Entity",
        from = "Column::WardrobeItemId",
        to = "super::wardrobe_item::Column::Id"
    )]
    WardrobeItem,
}

impl Related<super::wardrobe_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WardrobeItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
