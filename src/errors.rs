//! Unified error type for the bookkeeping core.
//!
//! Every fallible operation returns [`Result<T>`]. The domain variants carry enough
//! context to render a user-facing message; infrastructure errors wrap their source.

use thiserror::Error;

/// Errors surfaced by catalog, ledger, sale, user and snapshot operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be used
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying `SeaORM` / `SQLite` failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A product id that must exist does not
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// The missing product id
        id: i64,
    },

    /// A user id that must exist does not
    #[error("User not found: {id}")]
    UserNotFound {
        /// The missing user id
        id: i64,
    },

    /// A sale id that must exist does not
    #[error("Sale not found: {id}")]
    SaleNotFound {
        /// The missing sale id
        id: i64,
    },

    /// Requested quantity exceeds what is on hand
    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Stock on hand at validation time
        available: i32,
        /// Quantity requested
        requested: i32,
    },

    /// Registration with an email that is already taken
    #[error("User already exists: {email}")]
    DuplicateIdentity {
        /// The conflicting email
        email: String,
    },

    /// Malformed input rejected at the boundary
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule was broken
        message: String,
    },

    /// A price that is negative or not finite
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// A stock movement quantity that is not a positive integer
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i32,
    },

    /// The acting user lacks the role an operation requires
    #[error("Forbidden: {actual} cannot perform an action requiring {required}")]
    Forbidden {
        /// Role the actor holds
        actual: String,
        /// Role the action requires
        required: String,
    },

    /// Email/password pair did not match a user
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// I/O failure while reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure in the snapshot codec
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
