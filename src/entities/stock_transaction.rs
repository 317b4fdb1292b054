//! Stock transaction entity - one immutable row of the stock ledger.
//!
//! `product_id` is a logical key only. Deleting a product leaves its history in place,
//! so no foreign key is declared.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a stock movement. The quantity is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TransactionKind {
    /// Goods received
    #[sea_orm(string_value = "IN")]
    #[serde(rename = "IN")]
    In,
    /// Goods removed (sales, wastage)
    #[sea_orm(string_value = "OUT")]
    #[serde(rename = "OUT")]
    Out,
    /// Manual correction; adds to stock like `In`
    #[sea_orm(string_value = "ADJUSTMENT")]
    #[serde(rename = "ADJUSTMENT")]
    Adjustment,
}

impl TransactionKind {
    /// Signed stock delta for a movement of `quantity` units of this kind.
    #[must_use]
    pub const fn signed(self, quantity: i32) -> i32 {
        match self {
            Self::Out => -quantity,
            Self::In | Self::Adjustment => quantity,
        }
    }

    /// Wire label, identical to the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    /// Unique identifier, increasing in creation order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product the movement applies to
    pub product_id: i64,
    /// IN, OUT or ADJUSTMENT
    pub kind: TransactionKind,
    /// Units moved, always positive
    pub quantity: i32,
    /// Free-text reason ("Sale", "Delivery", ...)
    pub reason: String,
    /// Email or id of the user who performed the movement
    pub performed_by: String,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Signed effect of this row on the product's stock.
    #[must_use]
    pub const fn delta(&self) -> i32 {
        self.kind.signed(self.quantity)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
