//! Stock ledger business logic.
//!
//! Every stock change is an immutable [`stock_transaction`] row plus an atomic
//! `stock = stock ± quantity` update of the product. Both writes happen inside one
//! database transaction, so the cached stock on the product always equals its opening
//! stock plus the signed sum of its ledger rows.

use crate::{
    config::settings::NegativeStockPolicy,
    entities::{Product, StockTransaction, TransactionKind, product, stock_transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Label shown for ledger rows whose product has since been deleted.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Arguments for a single stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Product to move
    pub product_id: i64,
    /// Units moved, must be positive
    pub quantity: i32,
    /// Direction of the movement
    pub kind: TransactionKind,
    /// Free-text reason
    pub reason: String,
    /// Email or id of the acting user
    pub performed_by: String,
}

/// A ledger row together with the product it references, if that still exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The ledger row
    pub transaction: stock_transaction::Model,
    /// The referenced product, `None` once deleted
    pub product: Option<product::Model>,
}

impl LedgerEntry {
    /// Product name, or [`UNKNOWN_PRODUCT`] when the product is gone.
    #[must_use]
    pub fn product_name(&self) -> &str {
        self.product
            .as_ref()
            .map_or(UNKNOWN_PRODUCT, |product| product.name.as_str())
    }
}

/// Records a stock movement and updates the product's stock in one database transaction.
///
/// `OUT` subtracts `quantity`; `IN` and `ADJUSTMENT` add it. Whether stock may end up
/// below zero is decided by `policy`.
///
/// # Errors
/// Returns an error if:
/// - `quantity` is not positive
/// - The product does not exist
/// - `policy` is `Reject` and the movement would leave stock negative
/// - A database operation fails
#[instrument(skip(db, adjustment), fields(product_id = adjustment.product_id, kind = %adjustment.kind))]
pub async fn adjust_stock(
    db: &DatabaseConnection,
    adjustment: StockAdjustment,
    policy: NegativeStockPolicy,
) -> Result<stock_transaction::Model> {
    validate_quantity(adjustment.quantity)?;

    let txn = db.begin().await?;
    let (product, movement) = apply_movement(&txn, &adjustment, policy).await?;
    txn.commit().await?;

    info!(
        quantity = adjustment.quantity,
        new_stock = product.stock,
        "Stock adjusted"
    );
    Ok(movement)
}

pub(crate) fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Applies one movement on an existing connection or transaction: stock first, then the
/// ledger row. Callers own the surrounding database transaction.
pub(crate) async fn apply_movement<C>(
    conn: &C,
    adjustment: &StockAdjustment,
    policy: NegativeStockPolicy,
) -> Result<(product::Model, stock_transaction::Model)>
where
    C: ConnectionTrait,
{
    let product = Product::find_by_id(adjustment.product_id)
        .one(conn)
        .await?
        .ok_or(Error::ProductNotFound {
            id: adjustment.product_id,
        })?;

    let delta = adjustment.kind.signed(adjustment.quantity);
    let new_stock = product
        .stock
        .checked_add(delta)
        .ok_or(Error::InvalidQuantity {
            quantity: adjustment.quantity,
        })?;

    if new_stock < 0 && policy == NegativeStockPolicy::Reject {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.stock,
            requested: adjustment.quantity,
        });
    }

    let now = chrono::Utc::now();
    Product::update_many()
        .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).add(delta))
        .col_expr(product::Column::UpdatedAt, Expr::value(now))
        .filter(product::Column::Id.eq(adjustment.product_id))
        .exec(conn)
        .await?;

    let movement = stock_transaction::ActiveModel {
        product_id: Set(adjustment.product_id),
        kind: Set(adjustment.kind),
        quantity: Set(adjustment.quantity),
        reason: Set(adjustment.reason.clone()),
        performed_by: Set(adjustment.performed_by.clone()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    debug!(
        product_id = adjustment.product_id,
        old_stock = product.stock,
        new_stock,
        "Ledger row appended"
    );

    let updated = Product::find_by_id(adjustment.product_id)
        .one(conn)
        .await?
        .ok_or(Error::ProductNotFound {
            id: adjustment.product_id,
        })?;
    Ok((updated, movement))
}

/// All ledger rows, newest first.
pub async fn list_transactions(db: &DatabaseConnection) -> Result<Vec<stock_transaction::Model>> {
    StockTransaction::find()
        .order_by_desc(stock_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The `limit` most recent ledger rows, newest first.
pub async fn recent_transactions(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<stock_transaction::Model>> {
    StockTransaction::find()
        .order_by_desc(stock_transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ledger rows for one product in the order they were recorded.
pub async fn transactions_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<stock_transaction::Model>> {
    StockTransaction::find()
        .filter(stock_transaction::Column::ProductId.eq(product_id))
        .order_by_asc(stock_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All ledger rows, newest first, each paired with its product when it still exists.
pub async fn transactions_with_products(db: &DatabaseConnection) -> Result<Vec<LedgerEntry>> {
    let products: HashMap<i64, product::Model> = Product::find()
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    Ok(list_transactions(db)
        .await?
        .into_iter()
        .map(|transaction| LedgerEntry {
            product: products.get(&transaction.product_id).cloned(),
            transaction,
        })
        .collect())
}

/// Signed sum of every ledger row for a product.
///
/// A product's stock should always equal its opening stock plus this value.
pub async fn ledger_delta(db: &DatabaseConnection, product_id: i64) -> Result<i64> {
    Ok(transactions_for_product(db, product_id)
        .await?
        .iter()
        .map(|row| i64::from(row.delta()))
        .sum())
}
