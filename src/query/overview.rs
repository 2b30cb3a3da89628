//! Dashboard headline numbers
//!
//! Only the sample count is mandatory. The province count, quality
//! distribution and average pH each degrade to a default when their statement
//! fails; only an unreachable database still aborts the overview.

use crate::error::{Guarded, QueryError};
use crate::query::types::{QualityCount, QualityCountRow, StatisticsOverview, DEFAULT_AVERAGE_PH};
use crate::query::utils::decimal_or;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

pub async fn statistics_overview(db: &PgPool) -> Result<StatisticsOverview, QueryError> {
    let total_samples: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM soil_samples")
        .fetch_one(db)
        .await?;

    let provinces = Guarded::settle(
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT province) FROM regions WHERE province IS NOT NULL",
        )
        .fetch_one(db)
        .await,
        0,
        "provinces covered",
    )?;

    let quality = Guarded::settle(
        sqlx::query_as::<_, QualityCountRow>(
            r#"
            SELECT quality_level, COUNT(*) AS count
            FROM soil_quality_assessment
            GROUP BY quality_level
            ORDER BY count DESC, quality_level
            "#,
        )
        .fetch_all(db)
        .await,
        Vec::new(),
        "quality distribution",
    )?;

    let average_ph = Guarded::settle(
        sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT AVG(ph_value) FROM soil_test_data WHERE ph_value IS NOT NULL",
        )
        .fetch_one(db)
        .await,
        None,
        "average pH",
    )?;

    let degraded = [
        provinces.is_defaulted(),
        quality.is_defaulted(),
        average_ph.is_defaulted(),
    ]
    .iter()
    .filter(|d| **d)
    .count();
    if degraded > 0 {
        info!(degraded, "Statistics overview served with defaults");
    }

    Ok(StatisticsOverview {
        total_samples,
        provinces_covered: provinces.into_inner(),
        average_ph: decimal_or(average_ph.into_inner(), DEFAULT_AVERAGE_PH),
        quality_distribution: quality
            .into_inner()
            .into_iter()
            .map(QualityCount::from)
            .collect(),
    })
}
