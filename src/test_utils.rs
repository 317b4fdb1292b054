//! Shared test utilities for the sweet shop core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        access::{Actor, hash_password},
        catalog::{self, NewProduct},
        user,
    },
    entities::{self, Role},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Email of the account created by [`create_admin`].
pub const TEST_ADMIN_EMAIL: &str = "admin@sweetshop.com";
/// Password of the account created by [`create_admin`].
pub const TEST_ADMIN_PASSWORD: &str = "admin123";

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Product fields with sensible defaults.
///
/// # Defaults
/// * `category`: "Candy"
/// * `price`: 2.0
/// * `stock`: 50
/// * `reorder_level`: 10
/// * `supplier`: "Test Supplier"
pub fn sample_product(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        category: "Candy".to_string(),
        price: 2.0,
        stock: 50,
        reorder_level: 10,
        supplier: "Test Supplier".to_string(),
        description: None,
        image_url: None,
    }
}

/// Creates a test product with sensible defaults. See [`sample_product`].
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    catalog::create_product(db, sample_product(name)).await
}

/// Creates a test product with custom price, opening stock and reorder threshold.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    stock: i32,
    reorder_level: i32,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            price,
            stock,
            reorder_level,
            ..sample_product(name)
        },
    )
    .await
}

/// Inserts a user directly, bypassing the admin check.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Role,
) -> Result<entities::user::Model> {
    user::insert_user(db, email.to_string(), hash_password(password), role).await
}

/// Creates the admin account and returns it as an actor.
pub async fn create_admin(db: &DatabaseConnection) -> Result<Actor> {
    let admin = create_test_user(db, TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, Role::Admin).await?;
    Ok(Actor::from(admin))
}
