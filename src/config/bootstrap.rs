//! First-start preparation of the store.
//!
//! Order matters: a legacy snapshot can only be imported into an empty store, so the
//! optional import runs before the configured default accounts are seeded. Seeding
//! is skipped when the import already brought users.

use crate::{
    config::{database, settings::ShopConfig},
    core::{
        snapshot::{self, ImportSummary},
        user,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::path::Path;
use tracing::{error, info};

/// What [`prepare_store`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Rows loaded from the snapshot, if one was given
    pub imported: Option<ImportSummary>,
    /// Default accounts created
    pub seeded: usize,
}

/// Ensures the schema, imports `snapshot_path` if given, then seeds default users.
///
/// # Errors
/// Returns an error if the schema cannot be created, the snapshot cannot be read or
/// imported, or seeding fails.
pub async fn prepare_store(
    db: &DatabaseConnection,
    config: &ShopConfig,
    snapshot_path: Option<&Path>,
) -> Result<BootstrapSummary> {
    database::create_tables(db).await?;

    let imported = match snapshot_path {
        Some(path) => {
            let legacy = snapshot::read_snapshot(path)?;
            let summary = snapshot::import_snapshot(db, &legacy)
                .await
                .inspect_err(|e| error!("Snapshot import from {} failed: {}", path.display(), e))?;
            info!(
                "Imported {} users, {} products, {} movements and {} sales from {}",
                summary.users,
                summary.products,
                summary.transactions,
                summary.sales,
                path.display()
            );
            Some(summary)
        }
        None => None,
    };

    let seeded = user::seed_default_users(db, &config.users).await?;
    if seeded > 0 {
        info!("Created {} default account(s)", seeded);
    }

    Ok(BootstrapSummary { imported, seeded })
}
