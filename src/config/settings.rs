//! Shop settings loaded from a TOML file.
//!
//! Every section is optional. A missing file yields [`ShopConfig::default`]: negative
//! stock allowed, a ten-entry activity feed trimmed to five for display, and no seeded
//! accounts.

use crate::entities::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Path used when `SHOP_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "shop.toml";

/// What the ledger does when a movement would leave stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStockPolicy {
    /// Persist the negative value (backorder semantics)
    #[default]
    Allow,
    /// Fail the movement with `InsufficientStock`
    Reject,
}

/// Inventory behaviour
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Negative stock handling for ledger movements
    pub negative_stock: NegativeStockPolicy,
}

/// Dashboard feed sizes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// How many recent sales and stock movements the dashboard collects
    pub recent_limit: u64,
    /// How many of those are shown in a summary
    pub display_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_limit: 10,
            display_limit: 5,
        }
    }
}

/// An account created on first start when the user table is empty
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    /// Login email
    pub email: String,
    /// Initial password, hashed before storage
    pub password: String,
    /// Access role
    pub role: Role,
}

/// Configuration structure representing the entire shop.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Inventory behaviour
    pub inventory: InventoryConfig,
    /// Dashboard feed sizes
    pub analytics: AnalyticsConfig,
    /// Default accounts
    pub users: Vec<SeedUser>,
}

/// Loads shop settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ShopConfig> {
    let path_ref = path.as_ref();
    debug!("Loading shop configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `SHOP_CONFIG` (default `shop.toml`), or defaults if the file is absent.
pub fn load_shop_config() -> Result<ShopConfig> {
    let path = std::env::var("SHOP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No configuration file at {}, using defaults", path);
        Ok(ShopConfig::default())
    }
}
