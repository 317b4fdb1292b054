//! Sale processing - point-of-sale checkout.
//!
//! A sale is validated in full against one snapshot of the catalog before anything is
//! written. Requested quantities are tracked per product, so an order that lists the same
//! product twice is checked against the combined quantity. Stock movements, the receipt
//! header and its line items are then written in a single database transaction; any
//! failure leaves products, the ledger and the sales log untouched.

use crate::{
    config::settings::NegativeStockPolicy,
    core::ledger::{self, StockAdjustment},
    entities::{Sale, SaleItem, TransactionKind, product, sale, sale_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Reason recorded on the ledger rows a sale produces.
pub const SALE_REASON: &str = "Sale";

/// One requested line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    /// Product to sell
    pub product_id: i64,
    /// Units requested
    pub quantity: i32,
}

/// A sale header with its line items in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleReceipt {
    /// Receipt header
    pub sale: sale::Model,
    /// Lines in the order they were entered
    pub items: Vec<sale_item::Model>,
}

impl SaleReceipt {
    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// A line that passed validation, priced from the snapshot.
struct PricedLine {
    line: SaleLine,
    unit_price: f64,
}

/// Validates every line against one snapshot, tracking what each product has left.
async fn validate_lines<C>(conn: &C, lines: &[SaleLine]) -> Result<Vec<PricedLine>>
where
    C: ConnectionTrait,
{
    let mut snapshot: HashMap<i64, product::Model> = HashMap::new();
    let mut remaining: HashMap<i64, i32> = HashMap::new();
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        if !snapshot.contains_key(&line.product_id) {
            let found = crate::core::catalog::get_product(conn, line.product_id)
                .await?
                .ok_or(Error::ProductNotFound {
                    id: line.product_id,
                })?;
            remaining.insert(found.id, found.stock);
            snapshot.insert(found.id, found);
        }
        let product = snapshot.get(&line.product_id).ok_or(Error::ProductNotFound {
            id: line.product_id,
        })?;

        let available = remaining.entry(product.id).or_insert(product.stock);
        if *available < line.quantity {
            return Err(Error::InsufficientStock {
                product: product.name.clone(),
                available: *available,
                requested: line.quantity,
            });
        }
        *available -= line.quantity;

        priced.push(PricedLine {
            line: *line,
            unit_price: product.price,
        });
    }

    Ok(priced)
}

/// Records a sale: one `OUT` ledger row per line with reason [`SALE_REASON`], then the
/// receipt with prices captured at validation time.
///
/// # Errors
/// Returns an error if:
/// - The order is empty or a line quantity is not positive
/// - A product does not exist
/// - A product's stock (after earlier lines for the same product) is below the request
/// - A database operation fails
///
/// On error nothing is written.
#[instrument(skip(db, lines), fields(lines = lines.len()))]
pub async fn record_sale(
    db: &DatabaseConnection,
    lines: &[SaleLine],
    sold_by: &str,
) -> Result<SaleReceipt> {
    if lines.is_empty() {
        return Err(Error::validation("Cart is empty"));
    }
    for line in lines {
        ledger::validate_quantity(line.quantity)?;
    }

    let txn = db.begin().await?;
    let priced = validate_lines(&txn, lines).await?;

    for priced_line in &priced {
        let adjustment = StockAdjustment {
            product_id: priced_line.line.product_id,
            quantity: priced_line.line.quantity,
            kind: TransactionKind::Out,
            reason: SALE_REASON.to_string(),
            performed_by: sold_by.to_string(),
        };
        ledger::apply_movement(&txn, &adjustment, NegativeStockPolicy::Reject).await?;
    }

    let total: f64 = priced
        .iter()
        .map(|priced_line| priced_line.unit_price * f64::from(priced_line.line.quantity))
        .sum();

    let header = sale::ActiveModel {
        total: Set(total),
        sold_by: Set(sold_by.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (position, priced_line) in priced.iter().enumerate() {
        let item = sale_item::ActiveModel {
            sale_id: Set(header.id),
            position: Set(i32::try_from(position).map_err(|_| Error::validation("Too many lines"))?),
            product_id: Set(priced_line.line.product_id),
            quantity: Set(priced_line.line.quantity),
            unit_price: Set(priced_line.unit_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    info!(sale_id = header.id, total, "Sale recorded");
    Ok(SaleReceipt {
        sale: header,
        items,
    })
}

/// Loads line items for `headers` and pairs them up, keeping the header order.
async fn attach_items(
    db: &DatabaseConnection,
    headers: Vec<sale::Model>,
) -> Result<Vec<SaleReceipt>> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = headers.iter().map(|header| header.id).collect();
    let mut grouped: HashMap<i64, Vec<sale_item::Model>> = HashMap::new();
    for item in SaleItem::find()
        .filter(sale_item::Column::SaleId.is_in(ids))
        .order_by_asc(sale_item::Column::SaleId)
        .order_by_asc(sale_item::Column::Position)
        .all(db)
        .await?
    {
        grouped.entry(item.sale_id).or_default().push(item);
    }

    Ok(headers
        .into_iter()
        .map(|sale| SaleReceipt {
            items: grouped.remove(&sale.id).unwrap_or_default(),
            sale,
        })
        .collect())
}

/// All receipts, newest first.
pub async fn list_sales(db: &DatabaseConnection) -> Result<Vec<SaleReceipt>> {
    let headers = Sale::find()
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;
    attach_items(db, headers).await
}

/// The `limit` most recent receipts, newest first.
pub async fn recent_sales(db: &DatabaseConnection, limit: u64) -> Result<Vec<SaleReceipt>> {
    let headers = Sale::find()
        .order_by_desc(sale::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    attach_items(db, headers).await
}

/// A single receipt by id, or `None` if it does not exist.
pub async fn get_sale(db: &DatabaseConnection, sale_id: i64) -> Result<Option<SaleReceipt>> {
    let Some(header) = Sale::find_by_id(sale_id).one(db).await? else {
        return Ok(None);
    };
    Ok(attach_items(db, vec![header]).await?.pop())
}
