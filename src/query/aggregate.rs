//! Pre-aggregated chart data - regional averages, histograms and monthly trends

use crate::error::QueryError;
use crate::query::types::{
    Distribution, PhBandRow, RegionNutrientStats, RegionStatsRow, TrendPoint, TrendRow,
};
use crate::query::utils::PhBand;
use sqlx::PgPool;
use tracing::{debug, warn};

/// Provinces returned by the regional summary
pub const REGION_STATS_LIMIT: i64 = 10;

/// Default trend window, in months
pub const DEFAULT_TREND_MONTHS: i32 = 12;

/// Per-province nutrient means, top provinces by sample count
pub async fn region_nutrient_stats(db: &PgPool) -> Result<Vec<RegionNutrientStats>, QueryError> {
    let sql = format!(
        r#"
        SELECT
            r.province AS province,
            AVG(t.total_nitrogen) AS avg_nitrogen,
            AVG(t.available_phosphorus) AS avg_phosphorus,
            AVG(t.available_potassium) AS avg_potassium,
            AVG(t.organic_matter) AS avg_organic,
            COUNT(s.id) AS sample_count
        FROM soil_samples s
        LEFT JOIN regions r ON s.region_id = r.id
        LEFT JOIN soil_test_data t ON s.id = t.sample_id
        WHERE r.province IS NOT NULL
        GROUP BY r.province
        HAVING COUNT(s.id) > 0
        ORDER BY sample_count DESC, r.province
        LIMIT {REGION_STATS_LIMIT}
        "#
    );

    let rows = sqlx::query_as::<_, RegionStatsRow>(&sql)
        .fetch_all(db)
        .await?;

    debug!("Aggregated nutrients for {} provinces", rows.len());

    Ok(rows.into_iter().map(RegionNutrientStats::from).collect())
}

/// Count of non-null pH readings per acidity band, ascending by band.
/// Bands with no readings are left out.
pub async fn ph_distribution(db: &PgPool) -> Result<Vec<Distribution>, QueryError> {
    let sql = format!(
        "SELECT {} AS band, COUNT(*) AS count \
         FROM soil_test_data t \
         WHERE t.ph_value IS NOT NULL \
         GROUP BY band \
         ORDER BY band",
        PhBand::case_expression("t.ph_value")
    );

    let rows = sqlx::query_as::<_, PhBandRow>(&sql).fetch_all(db).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let band = row.band;
            let entry = row.into_distribution();
            if entry.is_none() {
                warn!("Skipping unknown pH band index {}", band);
            }
            entry
        })
        .collect())
}

/// Sample count per soil type, most common first
pub async fn texture_distribution(db: &PgPool) -> Result<Vec<Distribution>, QueryError> {
    let rows = sqlx::query_as::<_, Distribution>(
        r#"
        SELECT
            st.type_name AS name,
            COUNT(s.id) AS value
        FROM soil_samples s
        LEFT JOIN soil_types st ON s.soil_type_id = st.id
        WHERE st.type_name IS NOT NULL
        GROUP BY st.type_name
        ORDER BY value DESC, st.type_name
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Monthly nutrient means over the trailing `months`, oldest month first.
///
/// Months without samples do not appear; the series is not zero-filled.
pub async fn nutrient_trend(db: &PgPool, months: i32) -> Result<Vec<TrendPoint>, QueryError> {
    let months = months.max(0);

    let rows = sqlx::query_as::<_, TrendRow>(
        r#"
        SELECT
            to_char(s.sampling_date, 'YYYY-MM') AS month,
            AVG(t.total_nitrogen) AS avg_nitrogen,
            AVG(t.available_phosphorus) AS avg_phosphorus,
            AVG(t.available_potassium) AS avg_potassium,
            AVG(t.organic_matter) AS avg_organic,
            COUNT(s.id) AS sample_count
        FROM soil_samples s
        LEFT JOIN soil_test_data t ON s.id = t.sample_id
        WHERE s.sampling_date >= NOW() - make_interval(months => $1)
          AND s.sampling_date <= NOW()
        GROUP BY to_char(s.sampling_date, 'YYYY-MM')
        ORDER BY month
        "#,
    )
    .bind(months)
    .fetch_all(db)
    .await?;

    debug!(months, points = rows.len(), "Built nutrient trend");

    Ok(rows.into_iter().map(TrendPoint::from).collect())
}
