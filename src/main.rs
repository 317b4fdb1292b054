use dotenvy::dotenv;
use std::{env, path::PathBuf};
use sweet_shop::{
    config::{bootstrap, database, settings},
    core::analytics,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load shop settings
    let config = settings::load_shop_config()
        .inspect_err(|e| error!("Failed to load shop configuration: {}", e))?;

    // 4. Open the database
    if env::var("DATABASE_URL").is_err() {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;

    // 5. Schema, optional one-off legacy import, then default accounts
    let snapshot_path = env::var("SHOP_IMPORT").ok().map(PathBuf::from);
    bootstrap::prepare_store(&db, &config, snapshot_path.as_deref()).await?;

    // 6. Summarize the shop
    let dashboard = analytics::dashboard(&db, config.analytics.recent_limit).await?;
    info!(
        "Revenue {} across {} sales, {} of {} products low on stock",
        analytics::format_currency(dashboard.total_revenue),
        dashboard.total_sales,
        dashboard.low_stock_count,
        dashboard.total_products
    );
    for receipt in dashboard.headline_sales(config.analytics.display_limit) {
        info!("{}", analytics::format_sale_summary(receipt));
    }
    for movement in dashboard
        .recent_transactions
        .iter()
        .take(config.analytics.display_limit)
    {
        info!("{}", analytics::format_movement_summary(movement));
    }

    Ok(())
}
