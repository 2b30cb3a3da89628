//! Single-entity lookups - quality assessments and monitoring-station history

use crate::error::QueryError;
use crate::query::types::{QualityAssessment, QualityAssessmentRow, ReadingRow, StationReading};
use sqlx::PgPool;
use tracing::debug;

/// Default history window, in days
pub const DEFAULT_HISTORY_DAYS: i32 = 30;

/// Quality assessment for a sample, matched by sample code or numeric id.
/// Returns `Ok(None)` when the sample has no assessment.
pub async fn quality_assessment(
    db: &PgPool,
    sample_id: &str,
) -> Result<Option<QualityAssessment>, QueryError> {
    let row = sqlx::query_as::<_, QualityAssessmentRow>(
        r#"
        SELECT
            qa.quality_level,
            qa.quality_score,
            qa.nitrogen_level,
            qa.phosphorus_level,
            qa.potassium_level,
            qa.ph_level,
            qa.organic_matter_level,
            qa.recommendations
        FROM soil_quality_assessment qa
        JOIN soil_samples s ON s.id = qa.sample_id
        WHERE s.sample_code = $1 OR s.id::text = $1
        ORDER BY s.id
        LIMIT 1
        "#,
    )
    .bind(sample_id.trim())
    .fetch_optional(db)
    .await?;

    if row.is_none() {
        debug!("No quality assessment for sample {}", sample_id);
    }

    Ok(row.map(QualityAssessment::from))
}

/// Readings of a station over the trailing `days`, oldest first
pub async fn station_history(
    db: &PgPool,
    station_code: &str,
    days: i32,
) -> Result<Vec<StationReading>, QueryError> {
    let rows = sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT
            hmd.monitoring_date,
            hmd.ph_value,
            hmd.organic_matter,
            hmd.moisture_content,
            hmd.temperature
        FROM historical_monitoring_data hmd
        JOIN monitoring_stations ms ON hmd.station_id = ms.id
        WHERE ms.station_code = $1
          AND hmd.monitoring_date >= NOW() - make_interval(days => $2)
        ORDER BY hmd.monitoring_date ASC
        "#,
    )
    .bind(station_code)
    .bind(days.max(0))
    .fetch_all(db)
    .await?;

    debug!(station = station_code, days, readings = rows.len(), "Loaded station history");

    Ok(rows.into_iter().map(StationReading::from).collect())
}
