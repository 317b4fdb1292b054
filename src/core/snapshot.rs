//! Legacy JSON snapshot codec.
//!
//! A snapshot is the four collections of the browser-era store, each a JSON array with
//! camelCase fields and string ids. Export renders the database in that layout; import
//! loads one into an empty database.

use crate::{
    core::{access::hash_password, ledger, sale},
    entities::{
        Product, Role, Sale, StockTransaction, TransactionKind, User, product, sale as sale_entity,
        sale_item, stock_transaction, user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path};
use tracing::{debug, info, instrument};

/// The four legacy collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Accounts
    #[serde(rename = "sweet_shop_users", default)]
    pub users: Vec<LegacyUser>,
    /// Catalog
    #[serde(rename = "sweet_shop_sweets", default)]
    pub sweets: Vec<LegacySweet>,
    /// Stock ledger
    #[serde(rename = "sweet_shop_transactions", default)]
    pub transactions: Vec<LegacyTransaction>,
    /// Sales log
    #[serde(rename = "sweet_shop_sales", default)]
    pub sales: Vec<LegacySale>,
}

/// An account. `password` holds plain text in old snapshots and a digest in exported ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUser {
    /// Numeric id as a string
    pub id: String,
    /// Login email
    pub email: String,
    /// Plain text or hex digest
    pub password: String,
    /// Access role
    pub role: Role,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySweet {
    /// Numeric id as a string
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: String,
    /// Unit price
    pub price: f64,
    /// Stock on hand
    pub stock: i32,
    /// Reorder threshold
    pub reorder_level: i32,
    /// Supplier name
    pub supplier: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// When the product was created
    pub created_at: DateTime<Utc>,
    /// When the product was last changed
    pub updated_at: DateTime<Utc>,
}

/// A stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransaction {
    /// Numeric id as a string, not necessarily unique
    pub id: String,
    /// Product id as a string
    pub sweet_id: String,
    /// Direction of the movement
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Units moved, positive
    pub quantity: i32,
    /// Free-text reason
    pub reason: String,
    /// Who made the movement
    pub performed_by: String,
    /// When the movement was made
    pub created_at: DateTime<Utc>,
}

/// A sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySaleItem {
    /// Product id as a string
    pub sweet_id: String,
    /// Units sold, positive
    pub quantity: i32,
    /// Captured unit price
    pub price: f64,
}

/// A receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySale {
    /// Numeric id as a string, not necessarily unique
    pub id: String,
    /// Lines in order as entered
    pub items: Vec<LegacySaleItem>,
    /// Receipt total
    pub total: f64,
    /// When the sale was recorded
    pub created_at: DateTime<Utc>,
    /// Who rang up the sale
    pub sold_by: String,
}

/// Row counts written by [`import_snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Accounts created
    pub users: usize,
    /// Products created
    pub products: usize,
    /// Stock movements created
    pub transactions: usize,
    /// Receipts created
    pub sales: usize,
}

fn parse_id(collection: &str, id: &str) -> Result<i64> {
    id.trim()
        .parse()
        .map_err(|_| Error::validation(format!("Invalid {collection} id: {id:?}")))
}

fn check_unique(collection: &str, ids: impl IntoIterator<Item = i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::validation(format!("Duplicate {collection} id: {id}")));
        }
    }
    Ok(())
}

fn is_digest(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Renders the whole database in the legacy layout, every collection in id order.
pub async fn export_snapshot(db: &DatabaseConnection) -> Result<Snapshot> {
    let users = User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|user| LegacyUser {
            id: user.id.to_string(),
            email: user.email,
            password: user.password_hash,
            role: user.role,
            created_at: user.created_at,
        })
        .collect();

    let sweets = Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|product| LegacySweet {
            id: product.id.to_string(),
            name: product.name,
            category: product.category,
            price: product.price,
            stock: product.stock,
            reorder_level: product.reorder_level,
            supplier: product.supplier,
            description: product.description,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
        .collect();

    let transactions = StockTransaction::find()
        .order_by_asc(stock_transaction::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|movement| LegacyTransaction {
            id: movement.id.to_string(),
            sweet_id: movement.product_id.to_string(),
            kind: movement.kind,
            quantity: movement.quantity,
            reason: movement.reason,
            performed_by: movement.performed_by,
            created_at: movement.created_at,
        })
        .collect();

    let mut receipts = sale::list_sales(db).await?;
    receipts.reverse();
    let sales = receipts
        .into_iter()
        .map(|receipt| LegacySale {
            id: receipt.sale.id.to_string(),
            items: receipt
                .items
                .into_iter()
                .map(|item| LegacySaleItem {
                    sweet_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    price: item.unit_price,
                })
                .collect(),
            total: receipt.sale.total,
            created_at: receipt.sale.created_at,
            sold_by: receipt.sale.sold_by,
        })
        .collect();

    Ok(Snapshot {
        users,
        sweets,
        transactions,
        sales,
    })
}

async fn store_is_empty<C>(db: &C) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(User::find().count(db).await? == 0
        && Product::find().count(db).await? == 0
        && StockTransaction::find().count(db).await? == 0
        && Sale::find().count(db).await? == 0)
}

/// Loads a snapshot into an empty database.
///
/// Users and products keep their legacy ids. Movements and sales are renumbered in array
/// order; their product references are kept even when the product no longer exists.
///
/// # Errors
/// Returns an error if:
/// - The database already holds data
/// - An id is not numeric, or a user or product id repeats
/// - A movement or sale line quantity is not positive
/// - Two users share an email
/// - Any insert fails (nothing is written in that case)
#[instrument(skip(db, snapshot))]
pub async fn import_snapshot(db: &DatabaseConnection, snapshot: &Snapshot) -> Result<ImportSummary> {
    let user_ids = snapshot
        .users
        .iter()
        .map(|user| parse_id("user", &user.id))
        .collect::<Result<Vec<_>>>()?;
    check_unique("user", user_ids.iter().copied())?;
    let mut emails = HashSet::new();
    for legacy in &snapshot.users {
        if !emails.insert(legacy.email.trim()) {
            return Err(Error::DuplicateIdentity {
                email: legacy.email.trim().to_string(),
            });
        }
    }

    let product_ids = snapshot
        .sweets
        .iter()
        .map(|sweet| parse_id("sweet", &sweet.id))
        .collect::<Result<Vec<_>>>()?;
    check_unique("sweet", product_ids.iter().copied())?;

    let mut movement_refs = Vec::with_capacity(snapshot.transactions.len());
    for legacy in &snapshot.transactions {
        parse_id("transaction", &legacy.id)?;
        ledger::validate_quantity(legacy.quantity)?;
        movement_refs.push(parse_id("sweet", &legacy.sweet_id)?);
    }
    let mut sale_refs = Vec::with_capacity(snapshot.sales.len());
    for legacy in &snapshot.sales {
        parse_id("sale", &legacy.id)?;
        let refs = legacy
            .items
            .iter()
            .map(|item| {
                ledger::validate_quantity(item.quantity)?;
                parse_id("sweet", &item.sweet_id)
            })
            .collect::<Result<Vec<_>>>()?;
        sale_refs.push(refs);
    }

    let txn = db.begin().await?;
    if !store_is_empty(&txn).await? {
        return Err(Error::validation(
            "Snapshots can only be imported into an empty store",
        ));
    }

    for (legacy, id) in snapshot.users.iter().zip(&user_ids) {
        let password_hash = if is_digest(&legacy.password) {
            legacy.password.clone()
        } else {
            hash_password(&legacy.password)
        };
        user::ActiveModel {
            id: Set(*id),
            email: Set(legacy.email.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(legacy.role),
            created_at: Set(legacy.created_at),
        }
        .insert(&txn)
        .await?;
    }

    for (legacy, id) in snapshot.sweets.iter().zip(&product_ids) {
        product::ActiveModel {
            id: Set(*id),
            name: Set(legacy.name.clone()),
            category: Set(legacy.category.clone()),
            price: Set(legacy.price),
            stock: Set(legacy.stock),
            reorder_level: Set(legacy.reorder_level),
            supplier: Set(legacy.supplier.clone()),
            description: Set(legacy.description.clone()),
            image_url: Set(legacy.image_url.clone()),
            created_at: Set(legacy.created_at),
            updated_at: Set(legacy.updated_at),
        }
        .insert(&txn)
        .await?;
    }

    for (legacy, product_id) in snapshot.transactions.iter().zip(movement_refs) {
        stock_transaction::ActiveModel {
            product_id: Set(product_id),
            kind: Set(legacy.kind),
            quantity: Set(legacy.quantity),
            reason: Set(legacy.reason.clone()),
            performed_by: Set(legacy.performed_by.clone()),
            created_at: Set(legacy.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for (legacy, refs) in snapshot.sales.iter().zip(sale_refs) {
        let header = sale_entity::ActiveModel {
            total: Set(legacy.total),
            sold_by: Set(legacy.sold_by.clone()),
            created_at: Set(legacy.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (position, (item, product_id)) in (0..).zip(legacy.items.iter().zip(refs)) {
            sale_item::ActiveModel {
                sale_id: Set(header.id),
                position: Set(position),
                product_id: Set(product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    let summary = ImportSummary {
        users: snapshot.users.len(),
        products: snapshot.sweets.len(),
        transactions: snapshot.transactions.len(),
        sales: snapshot.sales.len(),
    };
    info!(?summary, "Snapshot imported");
    Ok(summary)
}

/// Reads a snapshot from a JSON file.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path = path.as_ref();
    debug!("Reading snapshot from {:?}", path);
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes a snapshot to a JSON file, replacing any existing file.
pub fn write_snapshot<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing snapshot to {:?}", path);
    std::fs::write(path, serde_json::to_string_pretty(snapshot)?)?;
    Ok(())
}
