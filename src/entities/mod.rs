//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod product;
pub mod sale;
pub mod sale_item;
pub mod stock_transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use sale_item::{Column as SaleItemColumn, Entity as SaleItem, Model as SaleItemModel};
pub use stock_transaction::{
    Column as StockTransactionColumn, Entity as StockTransaction,
    Model as StockTransactionModel, TransactionKind,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
