//! Product entity - a catalog entry ("sweet") with its cached stock level.
//!
//! `stock` is the fast-path projection of the stock ledger. It is only written by
//! catalog creation and by ledger movements, never by a catalog update.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Chocolate Truffle")
    pub name: String,
    /// Free-form category used for filtering
    pub category: String,
    /// Current unit price
    pub price: f64,
    /// Units on hand; may go negative when the negative-stock policy allows it
    pub stock: i32,
    /// Stock at or below this level counts as low stock
    pub reorder_level: i32,
    /// Supplier name
    pub supplier: String,
    /// Optional long description
    pub description: Option<String>,
    /// Optional image reference
    pub image_url: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Whether stock is at or below the reorder threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_level
    }
}

/// Products reference nothing; ledger rows point at them by logical key only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
