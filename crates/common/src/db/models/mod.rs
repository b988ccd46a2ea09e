//! SeaORM entity models
//!
//! Database entities for the Vestia combination engine. Wardrobe items,
//! categories, and their images are owned by the wardrobe subsystem and are
//! read-only here; combinations and their memberships are owned by this
//! engine.

pub mod category;
pub mod combination;
pub mod combination_item;
pub mod item_image;
pub mod wardrobe_item;
pub mod wardrobe_item_category;

pub use category::{
    ActiveModel as CategoryActiveModel,
    Column as CategoryColumn,
    Entity as CategoryEntity,
    Model as Category,
};

pub use combination::{
    ActiveModel as CombinationActiveModel,
    Column as CombinationColumn,
    CombinationStatus,
    Entity as CombinationEntity,
    Model as Combination,
};

pub use combination_item::{
    ActiveModel as CombinationItemActiveModel,
    Column as CombinationItemColumn,
    Entity as CombinationItemEntity,
    MembershipStatus,
    Model as CombinationItem,
};

pub use item_image::{
    ActiveModel as ItemImageActiveModel,
    Column as ItemImageColumn,
    Entity as ItemImageEntity,
    Model as ItemImage,
};

pub use wardrobe_item::{
    ActiveModel as WardrobeItemActiveModel,
    Column as WardrobeItemColumn,
    Entity as WardrobeItemEntity,
    Model as WardrobeItem,
};

pub use wardrobe_item_category::{
    ActiveModel as WardrobeItemCategoryActiveModel,
    Column as WardrobeItemCategoryColumn,
    Entity as WardrobeItemCategoryEntity,
    Model as WardrobeItemCategory,
};
