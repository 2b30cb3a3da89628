//! Database smoke check - runs the main read queries once against the configured database

use anyhow::{Context, Result};
use soil_data_api::config::Config;
use soil_data_api::query::{aggregate, overview, samples, SampleFilters};
use sqlx::PgPool;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("Starting database smoke check");

    let config = Config::from_env()?;
    let db = config.connect().await?;
    info!("Database connected");

    let result = run_checks(&db).await;

    db.close().await;
    info!("Database pool closed");

    match result {
        Ok(()) => {
            info!("All database checks passed");
            Ok(())
        }
        Err(e) => {
            error!("Database check failed: {:#}", e);
            error!("Check that PostgreSQL is running, DATABASE_URL is correct, the schema is loaded and the user can read it");
            Err(e)
        }
    }
}

async fn run_checks(db: &PgPool) -> Result<()> {
    info!("Step 1/4: Statistics overview...");
    let overview = overview::statistics_overview(db)
        .await
        .context("statistics overview")?;
    info!(
        "✓ {} samples across {} provinces, average pH {:.2}",
        overview.total_samples, overview.provinces_covered, overview.average_ph
    );

    info!("Step 2/4: Map samples...");
    let listed = samples::list_samples(db, &SampleFilters::default())
        .await
        .context("sample listing")?;
    info!("✓ {} samples listed", listed.len());
    if let Some(first) = listed.first() {
        info!("First sample: {:?}", first);
    }

    info!("Step 3/4: Regional nutrient stats...");
    let regions = aggregate::region_nutrient_stats(db)
        .await
        .context("region nutrient stats")?;
    info!("✓ {} provinces aggregated", regions.len());

    info!("Step 4/4: pH distribution...");
    let bands = aggregate::ph_distribution(db)
        .await
        .context("pH distribution")?;
    info!("✓ {} pH bands populated", bands.len());

    Ok(())
}
