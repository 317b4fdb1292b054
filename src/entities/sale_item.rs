//! Sale line item entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Receipt this line belongs to
    pub sale_id: i64,
    /// Zero-based position within the order as entered
    pub position: i32,
    /// Product sold (logical key, the product may later be deleted)
    pub product_id: i64,
    /// Units sold
    pub quantity: i32,
    /// Unit price captured when the sale was recorded
    pub unit_price: f64,
}

impl Model {
    /// Captured unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Defines relationships between `SaleItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
