/// First-start schema, snapshot import and seeding
pub mod bootstrap;

/// Database connection and schema creation
pub mod database;

/// Shop settings loaded from `shop.toml`
pub mod settings;
