//! Sale entity - an immutable checkout receipt header.
//!
//! Line items live in [`super::sale_item`] and carry the unit price captured at sale
//! time, so `total` never depends on current catalog prices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier, increasing in creation order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sum of captured unit price times quantity over all lines
    pub total: f64,
    /// Email or id of the user who rang up the sale
    pub sold_by: String,
    /// When the sale was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One sale has many line items
    #[sea_orm(has_many = "super::sale_item::Entity")]
    Items,
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
