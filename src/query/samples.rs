//! Sample listings - the map view and the paginated data table

use crate::error::QueryError;
use crate::query::predicate::Predicate;
use crate::query::types::{
    PageRequest, SampleFilters, SampleRecord, SampleRow, TableFilters, TablePage, TableRecord,
    TableRow,
};
use sqlx::PgPool;
use tracing::debug;

/// Hard cap on rows returned to the map
pub const MAP_SAMPLE_LIMIT: i64 = 1000;

/// Joins shared by both listings. Measurements, regions and soil types are
/// optional, so every join is outer.
const SAMPLE_JOINS: &str = "\
    FROM soil_samples s \
    LEFT JOIN regions r ON s.region_id = r.id \
    LEFT JOIN soil_types st ON s.soil_type_id = st.id \
    LEFT JOIN soil_test_data t ON s.id = t.sample_id";

/// Column list for the map listing, aliased to `SampleRow`.
const MAP_COLUMNS: &str = "\
    s.id, s.sample_code, s.sampling_date AS sample_time, \
    s.latitude, s.longitude, s.sampler_name AS remark, \
    CONCAT(r.province, r.city, r.county) AS region, \
    st.type_name AS soil_type, \
    t.ph_value AS ph, t.total_nitrogen AS nitrogen, \
    t.available_phosphorus AS phosphorus, t.available_potassium AS potassium, \
    t.organic_matter AS organic";

/// Column list for the data table, aliased to `TableRow`.
const TABLE_COLUMNS: &str = "\
    s.id, s.sample_code, s.sampling_date AS time, \
    CONCAT(r.province, r.city, r.county) AS location, \
    t.ph_value AS ph, t.total_nitrogen AS nitrogen, \
    t.available_phosphorus AS phosphorus, t.available_potassium AS potassium, \
    t.organic_matter AS organic, st.type_name AS texture";

/// Newest first; id breaks ties so pages are stable
const NEWEST_FIRST: &str = "ORDER BY s.sampling_date DESC, s.id DESC";

/// Location columns matched by the table's free-text filter
const LOCATION_COLUMNS: [&str; 3] = ["r.province", "r.city", "r.county"];

/// Build the WHERE clause for the map listing
pub fn sample_predicate(filters: &SampleFilters) -> Predicate {
    Predicate::new()
        .equals("r.province", filters.province.as_deref())
        .at_least("t.ph_value", filters.ph_min)
        .at_most("t.ph_value", filters.ph_max)
        .at_least("s.sampling_date", filters.date_start)
        .at_most("s.sampling_date", filters.date_end)
}

/// Build the WHERE clause for the data table
pub fn table_predicate(filters: &TableFilters) -> Predicate {
    Predicate::new()
        .contains_any(&LOCATION_COLUMNS, filters.location.as_deref())
        .at_least("t.ph_value", filters.ph_min)
        .at_most("t.ph_value", filters.ph_max)
}

/// Samples for the map view, newest first, at most `MAP_SAMPLE_LIMIT`
pub async fn list_samples(
    db: &PgPool,
    filters: &SampleFilters,
) -> Result<Vec<SampleRecord>, QueryError> {
    let predicate = sample_predicate(filters);
    let sql = format!(
        "SELECT {MAP_COLUMNS} {SAMPLE_JOINS} {} {NEWEST_FIRST} LIMIT {MAP_SAMPLE_LIMIT}",
        predicate.where_clause()
    );
    debug!(
        filtered = !predicate.is_empty(),
        binds = predicate.binds().len(),
        "Listing map samples"
    );

    let rows = predicate
        .bind_as(sqlx::query_as::<_, SampleRow>(&sql))
        .fetch_all(db)
        .await?;

    Ok(rows.into_iter().map(SampleRecord::from).collect())
}

/// One page of the data table plus the total matching row count.
///
/// The COUNT and the page are two separate statements sharing one predicate.
/// They are not run in a transaction, so a write landing between them can
/// make `total` disagree with `data`.
pub async fn data_table(
    db: &PgPool,
    request: PageRequest,
    filters: &TableFilters,
) -> Result<TablePage, QueryError> {
    let predicate = table_predicate(filters);
    let where_clause = predicate.where_clause();

    let count_sql = format!("SELECT COUNT(*) {SAMPLE_JOINS} {where_clause}");

    let limit_idx = predicate.next_placeholder();
    let data_sql = format!(
        "SELECT {TABLE_COLUMNS} {SAMPLE_JOINS} {where_clause} {NEWEST_FIRST} \
         LIMIT ${limit_idx} OFFSET ${}",
        limit_idx + 1
    );

    debug!(
        page = request.page(),
        page_size = request.page_size(),
        filtered = !predicate.is_empty(),
        binds = predicate.binds().len(),
        "Loading data table page"
    );

    let total: i64 = predicate
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(db)
        .await?;

    let rows = predicate
        .bind_as(sqlx::query_as::<_, TableRow>(&data_sql))
        .bind(request.page_size())
        .bind(request.offset())
        .fetch_all(db)
        .await?;

    let data = rows.into_iter().map(TableRecord::from).collect();

    Ok(TablePage::new(data, total, request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::BindValue;
    use chrono::NaiveDate;

    #[test]
    fn test_map_predicate_full() {
        let filters = SampleFilters {
            province: Some("山东省".to_string()),
            ph_min: Some(6.0),
            ph_max: Some(8.0),
            date_start: NaiveDate::from_ymd_opt(2024, 1, 1),
            date_end: NaiveDate::from_ymd_opt(2024, 12, 31),
        };

        let predicate = sample_predicate(&filters);

        assert_eq!(
            predicate.where_clause(),
            "WHERE r.province = $1 AND t.ph_value >= $2 AND t.ph_value <= $3 \
             AND s.sampling_date >= $4 AND s.sampling_date <= $5"
        );
        assert_eq!(predicate.binds().len(), 5);
    }

    #[test]
    fn test_map_predicate_partial() {
        let filters = SampleFilters {
            ph_max: Some(7.0),
            date_start: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };

        let predicate = sample_predicate(&filters);

        assert_eq!(
            predicate.where_clause(),
            "WHERE t.ph_value <= $1 AND s.sampling_date >= $2"
        );
    }

    #[test]
    fn test_table_limit_follows_filter_binds() {
        let filters = TableFilters {
            location: Some("济南".to_string()),
            ph_min: Some(5.5),
            ph_max: None,
        };

        let predicate = table_predicate(&filters);

        // three location patterns + phMin, so LIMIT/OFFSET land on $5/$6
        assert_eq!(predicate.next_placeholder(), 5);
        assert_eq!(predicate.binds()[3], BindValue::Float(5.5));
    }

    #[test]
    fn test_table_without_filters() {
        let predicate = table_predicate(&TableFilters::default());
        assert_eq!(predicate.where_clause(), "");
        assert_eq!(predicate.next_placeholder(), 1);
    }
}
