//! Dashboard analytics.
//!
//! A read-only projection over products, the ledger and the sales log. Nothing is
//! cached; every call re-reads the store, so the same store content always yields the
//! same [`Dashboard`]. The formatting helpers return plain strings for whatever layer
//! renders the dashboard.

use crate::{
    core::{
        catalog, ledger,
        sale::{self, SaleReceipt},
    },
    entities::{Product, Sale, sale as sale_entity, stock_transaction},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

/// Summary metrics for the shop.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Sum of every sale total
    pub total_revenue: f64,
    /// Number of sales recorded
    pub total_sales: u64,
    /// Products at or below their reorder threshold
    pub low_stock_count: u64,
    /// Products in the catalog
    pub total_products: u64,
    /// Most recent sales, newest first
    pub recent_sales: Vec<SaleReceipt>,
    /// Most recent stock movements, newest first
    pub recent_transactions: Vec<stock_transaction::Model>,
}

impl Dashboard {
    /// The first `limit` recent sales, for compact display.
    #[must_use]
    pub fn headline_sales(&self, limit: usize) -> &[SaleReceipt] {
        &self.recent_sales[..limit.min(self.recent_sales.len())]
    }
}

/// Sum of every stored sale total, in recording order.
pub async fn total_revenue(db: &DatabaseConnection) -> Result<f64> {
    Ok(Sale::find()
        .order_by_asc(sale_entity::Column::Id)
        .all(db)
        .await?
        .iter()
        .map(|sale| sale.total)
        .sum())
}

/// Builds the dashboard, collecting `recent_limit` recent sales and stock movements.
pub async fn dashboard(db: &DatabaseConnection, recent_limit: u64) -> Result<Dashboard> {
    let total_revenue = total_revenue(db).await?;
    let total_sales = Sale::find().count(db).await?;
    let low_stock_count = Product::find()
        .filter(catalog::low_stock_condition())
        .count(db)
        .await?;
    let total_products = Product::find().count(db).await?;
    let recent_sales = sale::recent_sales(db, recent_limit).await?;
    let recent_transactions = ledger::recent_transactions(db, recent_limit).await?;

    tracing::debug!(
        total_revenue,
        total_sales,
        low_stock_count,
        total_products,
        "Dashboard computed"
    );

    Ok(Dashboard {
        total_revenue,
        total_sales,
        low_stock_count,
        total_products,
        recent_sales,
        recent_transactions,
    })
}

/// Formats an amount as dollars with two decimals, e.g. `$35.50`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

/// Formats a stock movement's signed effect, e.g. `+5` or `-2`.
#[must_use]
pub fn format_movement_quantity(movement: &stock_transaction::Model) -> String {
    format!("{:+}", movement.delta())
}

/// One-line summary of a stock movement.
#[must_use]
pub fn format_movement_summary(movement: &stock_transaction::Model) -> String {
    format!(
        "{} | {} | {} | {}",
        format_movement_quantity(movement),
        movement.kind,
        movement.reason,
        movement.performed_by
    )
}

/// One-line summary of a receipt.
#[must_use]
pub fn format_sale_summary(receipt: &SaleReceipt) -> String {
    let units = receipt.unit_count();
    let noun = if units == 1 { "item" } else { "items" };
    format!(
        "Sale #{} | {units} {noun} | {} | {}",
        receipt.sale.id,
        format_currency(receipt.sale.total),
        receipt.sale.sold_by
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::settings::NegativeStockPolicy;
    use crate::core::ledger::StockAdjustment;
    use crate::core::sale::{SaleLine, record_sale};
    use crate::entities::TransactionKind;
    use crate::test_utils::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(35.5), "$35.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-2.25), "-$2.25");
    }

    #[test]
    fn test_format_movement_summary() {
        let movement = stock_transaction::Model {
            id: 1,
            product_id: 1,
            kind: TransactionKind::Out,
            quantity: 2,
            reason: "Sale".to_string(),
            performed_by: "alice".to_string(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(format_movement_quantity(&movement), "-2");
        assert_eq!(format_movement_summary(&movement), "-2 | OUT | Sale | alice");

        let restock = stock_transaction::Model {
            kind: TransactionKind::Adjustment,
            ..movement
        };
        assert_eq!(format_movement_quantity(&restock), "+2");
    }

    #[tokio::test]
    async fn test_empty_dashboard() -> Result<()> {
        let db = setup_test_db().await?;

        let dashboard = dashboard(&db, 10).await?;
        assert_eq!(dashboard.total_revenue, 0.0);
        assert_eq!(dashboard.total_sales, 0);
        assert_eq!(dashboard.low_stock_count, 0);
        assert_eq!(dashboard.total_products, 0);
        assert!(dashboard.recent_sales.is_empty());
        assert!(dashboard.headline_sales(5).is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_revenue_and_sale_count() -> Result<()> {
        let db = setup_test_db().await?;
        let ten = create_custom_product(&db, "Ten", 10.0, 10, 0).await?;
        let five_fifty = create_custom_product(&db, "FiveFifty", 5.5, 10, 0).await?;
        let twenty = create_custom_product(&db, "Twenty", 20.0, 10, 0).await?;

        for product in [&ten, &five_fifty, &twenty] {
            record_sale(
                &db,
                &[SaleLine {
                    product_id: product.id,
                    quantity: 1,
                }],
                "alice",
            )
            .await?;
        }

        assert_eq!(total_revenue(&db).await?, 35.5);

        let dashboard = dashboard(&db, 10).await?;
        assert_eq!(dashboard.total_revenue, 35.5);
        assert_eq!(dashboard.total_sales, 3);
        assert_eq!(dashboard.total_products, 3);
        assert_eq!(dashboard.recent_sales.len(), 3);
        assert_eq!(dashboard.recent_sales[0].sale.total, 20.0);
        assert_eq!(dashboard.recent_transactions.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_recent_feed_is_limited_and_trimmed() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "Bonbon", 1.0, 100, 0).await?;

        for quantity in 1..=12 {
            record_sale(
                &db,
                &[SaleLine {
                    product_id: product.id,
                    quantity,
                }],
                "bob",
            )
            .await?;
        }

        let dashboard = dashboard(&db, 10).await?;
        assert_eq!(dashboard.total_sales, 12);
        assert_eq!(dashboard.recent_sales.len(), 10);
        assert_eq!(dashboard.recent_transactions.len(), 10);
        assert_eq!(dashboard.recent_sales[0].sale.total, 12.0);

        let headline = dashboard.headline_sales(5);
        assert_eq!(headline.len(), 5);
        assert_eq!(headline[4].sale.total, 8.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_count_follows_ledger() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "Liquorice", 1.0, 8, 5).await?;
        create_custom_product(&db, "Marshmallow", 1.0, 1, 5).await?;

        assert_eq!(dashboard(&db, 10).await?.low_stock_count, 1);

        ledger::adjust_stock(
            &db,
            StockAdjustment {
                product_id: product.id,
                quantity: 3,
                kind: TransactionKind::Out,
                reason: "Damaged".to_string(),
                performed_by: "carol".to_string(),
            },
            NegativeStockPolicy::Allow,
        )
        .await?;

        let first = dashboard(&db, 10).await?;
        let second = dashboard(&db, 10).await?;
        assert_eq!(first.low_stock_count, 2);
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_format_sale_summary() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "Pastille", 1.5, 10, 0).await?;

        let receipt = record_sale(
            &db,
            &[SaleLine {
                product_id: product.id,
                quantity: 3,
            }],
            "dave",
        )
        .await?;

        assert_eq!(
            format_sale_summary(&receipt),
            format!("Sale #{} | 3 items | $4.50 | dave", receipt.sale.id)
        );

        Ok(())
    }
}
