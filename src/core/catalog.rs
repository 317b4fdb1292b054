//! Catalog business logic - CRUD over products.
//!
//! The catalog owns every product field except `stock` after creation: stock moves only
//! through the ledger in [`crate::core::ledger`], so the cached value and the ledger
//! history cannot drift apart through a catalog edit.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};
use tracing::{info, instrument};

/// Fields for a new catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Category used for filtering
    pub category: String,
    /// Unit price, finite and non-negative
    pub price: f64,
    /// Opening stock, non-negative
    pub stock: i32,
    /// Reorder threshold, non-negative
    pub reorder_level: i32,
    /// Supplier name
    pub supplier: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional image reference
    pub image_url: Option<String>,
}

/// Partial update of a product. `None` leaves a field untouched.
///
/// `description` and `image_url` are doubly optional: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    /// New name
    pub name: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New unit price
    pub price: Option<f64>,
    /// New reorder threshold
    pub reorder_level: Option<i32>,
    /// New supplier
    pub supplier: Option<String>,
    /// New or cleared description
    pub description: Option<Option<String>>,
    /// New or cleared image reference
    pub image_url: Option<Option<String>>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidPrice { price });
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(Error::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

/// Retrieves every product in insertion order.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id, or `None` if it does not exist.
///
/// Generic over the connection so the ledger and sale processor can read inside
/// their own database transaction.
pub async fn get_product<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, assigning its id and timestamps.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative or not finite
/// - The opening stock or reorder threshold is negative
/// - The database insert fails
#[instrument(skip(db, fields), fields(name = %fields.name))]
pub async fn create_product(db: &DatabaseConnection, fields: NewProduct) -> Result<product::Model> {
    validate_name(&fields.name)?;
    validate_price(fields.price)?;
    validate_non_negative("Stock", fields.stock)?;
    validate_non_negative("Reorder level", fields.reorder_level)?;

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(fields.name.trim().to_string()),
        category: Set(fields.category.trim().to_string()),
        price: Set(fields.price),
        stock: Set(fields.stock),
        reorder_level: Set(fields.reorder_level),
        supplier: Set(fields.supplier.trim().to_string()),
        description: Set(fields.description),
        image_url: Set(fields.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = product.insert(db).await?;
    info!(product_id = created.id, "Product created");
    Ok(created)
}

/// Merges `patch` into an existing product and refreshes its updated timestamp.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - A patched field fails the same validation as [`create_product`]
/// - The database update fails
#[instrument(skip(db, patch))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    patch: ProductPatch,
) -> Result<product::Model> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(reorder_level) = patch.reorder_level {
        validate_non_negative("Reorder level", reorder_level)?;
    }

    let mut product: product::ActiveModel = get_product(db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    if let Some(name) = patch.name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(category) = patch.category {
        product.category = Set(category.trim().to_string());
    }
    if let Some(price) = patch.price {
        product.price = Set(price);
    }
    if let Some(reorder_level) = patch.reorder_level {
        product.reorder_level = Set(reorder_level);
    }
    if let Some(supplier) = patch.supplier {
        product.supplier = Set(supplier.trim().to_string());
    }
    if let Some(description) = patch.description {
        product.description = Set(description);
    }
    if let Some(image_url) = patch.image_url {
        product.image_url = Set(image_url);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Removes a product. Deleting an id that does not exist is a silent no-op.
///
/// Ledger rows and sale lines that reference the product are kept.
/// Returns whether a row was removed.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<bool> {
    let result = Product::delete_by_id(product_id).exec(db).await?;
    if result.rows_affected > 0 {
        info!("Product deleted");
    }
    Ok(result.rows_affected > 0)
}

/// Products whose stock is at or below their reorder threshold, in insertion order.
pub async fn low_stock_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(low_stock_condition())
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Escapes `LIKE` metacharacters so the text matches literally under `ESCAPE '\\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn low_stock_condition() -> Condition {
    Condition::all()
        .add(Expr::col(product::Column::Stock).lte(Expr::col(product::Column::ReorderLevel)))
}

/// Products whose name, category or supplier contains `query` literally, ignoring case.
///
/// `%` and `_` match only themselves. `SQLite` `LIKE` folds ASCII letters only, so
/// non-ASCII text matches case-sensitively. An empty or whitespace-only query returns
/// the whole catalog.
pub async fn search_products(db: &DatabaseConnection, query: &str) -> Result<Vec<product::Model>> {
    let query = query.trim();
    if query.is_empty() {
        return list_products(db).await;
    }

    let pattern = format!("%{}%", escape_like(query));
    let matches = |column: product::Column| {
        Expr::col(column).like(LikeExpr::new(pattern.clone()).escape('\\'))
    };

    Product::find()
        .filter(
            Condition::any()
                .add(matches(product::Column::Name))
                .add(matches(product::Column::Category))
                .add(matches(product::Column::Supplier)),
        )
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut fields = sample_product("   ");
        let result = create_product(&db, fields.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        fields = sample_product("Fudge");
        fields.price = -1.0;
        let result = create_product(&db, fields.clone()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidPrice { price } if price == -1.0
        ));

        fields.price = f64::NAN;
        let result = create_product(&db, fields.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPrice { price: _ }));

        fields = sample_product("Fudge");
        fields.stock = -3;
        let result = create_product(&db, fields.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        fields = sample_product("Fudge");
        fields.reorder_level = -1;
        let result = create_product(&db, fields).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() -> Result<()> {
        let db = setup_test_db().await?;

        let fields = NewProduct {
            name: "Chocolate Truffle".to_string(),
            category: "Chocolate".to_string(),
            price: 2.5,
            stock: 40,
            reorder_level: 10,
            supplier: "Cocoa Co".to_string(),
            description: Some("Dark ganache".to_string()),
            image_url: Some("truffle.png".to_string()),
        };
        let created = create_product(&db, fields.clone()).await?;
        let found = get_product(&db, created.id).await?.unwrap();

        assert_eq!(found, created);
        assert!(found.id > 0);
        assert_eq!(found.created_at, found.updated_at);
        assert_eq!(found.name, fields.name);
        assert_eq!(found.category, fields.category);
        assert_eq!(found.price, fields.price);
        assert_eq!(found.stock, fields.stock);
        assert_eq!(found.reorder_level, fields.reorder_level);
        assert_eq!(found.supplier, fields.supplier);
        assert_eq!(found.description, fields.description);
        assert_eq!(found.image_url, fields.image_url);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_missing_is_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_product(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_in_insertion_order() -> Result<()> {
        let db = setup_test_db().await?;

        let zebra = create_test_product(&db, "Zebra Bar").await?;
        let apple = create_test_product(&db, "Apple Drop").await?;

        let products = list_products(&db).await?;
        assert_eq!(products, vec![zebra, apple]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_merges_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "Toffee", 1.25, 12, 4).await?;

        let updated = update_product(
            &db,
            product.id,
            ProductPatch {
                price: Some(1.75),
                description: Some(Some("Butter toffee".to_string())),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.id, product.id);
        assert_eq!(updated.name, "Toffee");
        assert_eq!(updated.price, 1.75);
        assert_eq!(updated.stock, 12);
        assert_eq!(updated.description.as_deref(), Some("Butter toffee"));
        assert!(updated.updated_at >= product.updated_at);
        assert_eq!(updated.created_at, product.created_at);

        let cleared = update_product(
            &db,
            product.id,
            ProductPatch {
                description: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert!(cleared.description.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_product(&db, 42, ProductPatch::default()).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { id: 42 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = update_product(
            &db,
            1,
            ProductPatch {
                price: Some(-0.5),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPrice { price: _ }));

        let result = update_product(
            &db,
            1,
            ProductPatch {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_twice_is_silent() -> Result<()> {
        let db = setup_test_db().await?;
        let keep = create_test_product(&db, "Keep").await?;
        let gone = create_test_product(&db, "Gone").await?;

        assert!(delete_product(&db, gone.id).await?);
        let after_first = list_products(&db).await?;

        assert!(!delete_product(&db, gone.id).await?);
        let after_second = list_products(&db).await?;

        assert_eq!(after_first, vec![keep]);
        assert_eq!(after_first, after_second);

        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_matches_threshold() -> Result<()> {
        let db = setup_test_db().await?;

        let below = create_custom_product(&db, "Below", 1.0, 2, 5).await?;
        let equal = create_custom_product(&db, "Equal", 1.0, 5, 5).await?;
        let _above = create_custom_product(&db, "Above", 1.0, 6, 5).await?;
        let empty = create_custom_product(&db, "Empty", 1.0, 0, 0).await?;

        let low = low_stock_products(&db).await?;
        assert_eq!(low, vec![below, equal, empty]);

        let expected: Vec<_> = list_products(&db)
            .await?
            .into_iter()
            .filter(product::Model::is_low_stock)
            .collect();
        assert_eq!(low, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_products() -> Result<()> {
        let db = setup_test_db().await?;

        let truffle = create_product(
            &db,
            NewProduct {
                category: "Chocolate".to_string(),
                ..sample_product("Truffle")
            },
        )
        .await?;
        let gummy = create_product(
            &db,
            NewProduct {
                supplier: "Haribo".to_string(),
                ..sample_product("Gummy Bears")
            },
        )
        .await?;

        assert_eq!(search_products(&db, "chocolate").await?, vec![truffle.clone()]);
        assert_eq!(search_products(&db, "HARIBO").await?, vec![gummy.clone()]);
        assert_eq!(search_products(&db, "bear").await?, vec![gummy.clone()]);
        assert_eq!(search_products(&db, "  ").await?, vec![truffle, gummy]);
        assert!(search_products(&db, "liquorice").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_product(&db, "Fudge").await?;
        create_test_product(&db, "Toffee").await?;
        let cocoa = create_test_product(&db, "70% Cocoa").await?;
        let strip = create_test_product(&db, "Sour_Strip").await?;

        assert_eq!(search_products(&db, "%").await?, vec![cocoa.clone()]);
        assert_eq!(search_products(&db, "0% c").await?, vec![cocoa]);
        assert_eq!(search_products(&db, "_").await?, vec![strip.clone()]);
        assert_eq!(search_products(&db, "r_s").await?, vec![strip]);
        assert!(search_products(&db, "\\").await?.is_empty());
        assert!(search_products(&db, "F_dge").await?.is_empty());

        Ok(())
    }
}
