//! Request filters, database rows and the records served to the dashboard
//!
//! Each `*Row` mirrors a SELECT list with every nullable column as `Option`.
//! The `From<*Row>` impls are the single place where NULLs get their
//! defaults; nothing nullable reaches the JSON boundary as a number.

use crate::query::utils::{decimal_or, empty_as_none, PhBand};
use crate::{page_offset, total_pages, MAX_PAGE_SIZE};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Soil type shown when a sample has none recorded
pub const UNKNOWN_SOIL_TYPE: &str = "未知";

/// pH reported by the map view when a sample has no measurement
pub const DEFAULT_MAP_PH: f64 = 7.0;

/// Average pH reported by the overview when it cannot be computed
pub const DEFAULT_AVERAGE_PH: f64 = 7.0;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filters accepted by the map sample listing
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ph_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ph_max: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_end: Option<NaiveDate>,
}

/// Filters accepted by the paginated data table
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ph_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ph_max: Option<f64>,
}

/// A 1-based page request, clamped to `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_PAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Map sample listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct SampleRow {
    pub id: i32,
    pub sample_code: Option<String>,
    pub sample_time: Option<NaiveDate>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub remark: Option<String>,
    pub region: Option<String>,
    pub soil_type: Option<String>,
    pub ph: Option<Decimal>,
    pub nitrogen: Option<Decimal>,
    pub phosphorus: Option<Decimal>,
    pub potassium: Option<Decimal>,
    pub organic: Option<Decimal>,
}

/// A sample plotted on the map. `value` is `[longitude, latitude, nitrogen]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub id: String,
    pub name: String,
    pub value: [f64; 3],
    pub sample_time: Option<NaiveDate>,
    pub region: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic: f64,
    pub soil_type: String,
    pub remark: String,
}

impl From<SampleRow> for SampleRecord {
    fn from(row: SampleRow) -> Self {
        let region = row.region.unwrap_or_default();
        let nitrogen = decimal_or(row.nitrogen, 0.0);
        SampleRecord {
            id: sample_id(row.sample_code, row.id),
            name: format!("{region}采样点"),
            value: [
                decimal_or(row.longitude, 0.0),
                decimal_or(row.latitude, 0.0),
                nitrogen,
            ],
            sample_time: row.sample_time,
            region,
            ph: decimal_or(row.ph, DEFAULT_MAP_PH),
            nitrogen,
            phosphorus: decimal_or(row.phosphorus, 0.0),
            potassium: decimal_or(row.potassium, 0.0),
            organic: decimal_or(row.organic, 0.0),
            soil_type: row
                .soil_type
                .unwrap_or_else(|| UNKNOWN_SOIL_TYPE.to_string()),
            remark: row.remark.unwrap_or_default(),
        }
    }
}

/// Public sample identifier: the sample code when present, else the row id
fn sample_id(code: Option<String>, id: i32) -> String {
    code.filter(|c| !c.is_empty())
        .unwrap_or_else(|| id.to_string())
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct TableRow {
    pub id: i32,
    pub sample_code: Option<String>,
    pub time: Option<NaiveDate>,
    pub location: Option<String>,
    pub ph: Option<Decimal>,
    pub nitrogen: Option<Decimal>,
    pub phosphorus: Option<Decimal>,
    pub potassium: Option<Decimal>,
    pub organic: Option<Decimal>,
    pub texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRecord {
    pub id: String,
    pub time: Option<NaiveDate>,
    pub location: String,
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic: f64,
    pub texture: String,
}

impl From<TableRow> for TableRecord {
    fn from(row: TableRow) -> Self {
        TableRecord {
            id: sample_id(row.sample_code, row.id),
            time: row.time,
            location: row.location.unwrap_or_default(),
            ph: decimal_or(row.ph, 0.0),
            nitrogen: decimal_or(row.nitrogen, 0.0),
            phosphorus: decimal_or(row.phosphorus, 0.0),
            potassium: decimal_or(row.potassium, 0.0),
            organic: decimal_or(row.organic, 0.0),
            texture: row.texture.unwrap_or_else(|| UNKNOWN_SOIL_TYPE.to_string()),
        }
    }
}

/// One page of the data table together with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub data: Vec<TableRecord>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl TablePage {
    pub fn new(data: Vec<TableRecord>, total: i64, request: PageRequest) -> Self {
        TablePage {
            data,
            total,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total, request.page_size()),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegionStatsRow {
    pub province: String,
    pub avg_nitrogen: Option<Decimal>,
    pub avg_phosphorus: Option<Decimal>,
    pub avg_potassium: Option<Decimal>,
    pub avg_organic: Option<Decimal>,
    pub sample_count: i64,
}

/// Mean nutrient levels of one province
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNutrientStats {
    pub province: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic: f64,
    pub sample_count: i64,
}

impl From<RegionStatsRow> for RegionNutrientStats {
    fn from(row: RegionStatsRow) -> Self {
        RegionNutrientStats {
            province: row.province,
            nitrogen: decimal_or(row.avg_nitrogen, 0.0),
            phosphorus: decimal_or(row.avg_phosphorus, 0.0),
            potassium: decimal_or(row.avg_potassium, 0.0),
            organic: decimal_or(row.avg_organic, 0.0),
            sample_count: row.sample_count,
        }
    }
}

/// A labelled count, the shape pie and bar charts consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Distribution {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhBandRow {
    pub band: i32,
    pub count: i64,
}

impl PhBandRow {
    /// `None` if the index does not name a band
    pub fn into_distribution(self) -> Option<Distribution> {
        PhBand::from_index(self.band).map(|band| Distribution {
            name: band.label(),
            value: self.count,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub month: String,
    pub avg_nitrogen: Option<Decimal>,
    pub avg_phosphorus: Option<Decimal>,
    pub avg_potassium: Option<Decimal>,
    pub avg_organic: Option<Decimal>,
    pub sample_count: i64,
}

/// Mean nutrient levels for one `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic: f64,
    pub sample_count: i64,
}

impl From<TrendRow> for TrendPoint {
    fn from(row: TrendRow) -> Self {
        TrendPoint {
            month: row.month,
            nitrogen: decimal_or(row.avg_nitrogen, 0.0),
            phosphorus: decimal_or(row.avg_phosphorus, 0.0),
            potassium: decimal_or(row.avg_potassium, 0.0),
            organic: decimal_or(row.avg_organic, 0.0),
            sample_count: row.sample_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct QualityAssessmentRow {
    pub quality_level: Option<String>,
    pub quality_score: Option<Decimal>,
    pub nitrogen_level: Option<String>,
    pub phosphorus_level: Option<String>,
    pub potassium_level: Option<String>,
    pub ph_level: Option<String>,
    pub organic_matter_level: Option<String>,
    pub recommendations: Option<String>,
}

/// Quality assessment of one sample. Field names are the column names the
/// dashboard already reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub quality_level: Option<String>,
    pub quality_score: f64,
    pub nitrogen_level: Option<String>,
    pub phosphorus_level: Option<String>,
    pub potassium_level: Option<String>,
    pub ph_level: Option<String>,
    pub organic_matter_level: Option<String>,
    pub recommendations: Option<String>,
}

impl From<QualityAssessmentRow> for QualityAssessment {
    fn from(row: QualityAssessmentRow) -> Self {
        QualityAssessment {
            quality_level: row.quality_level,
            quality_score: decimal_or(row.quality_score, 0.0),
            nitrogen_level: row.nitrogen_level,
            phosphorus_level: row.phosphorus_level,
            potassium_level: row.potassium_level,
            ph_level: row.ph_level,
            organic_matter_level: row.organic_matter_level,
            recommendations: row.recommendations,
        }
    }
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ReadingRow {
    pub monitoring_date: Option<NaiveDate>,
    pub ph_value: Option<Decimal>,
    pub organic_matter: Option<Decimal>,
    pub moisture_content: Option<Decimal>,
    pub temperature: Option<Decimal>,
}

/// One monitoring-station reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReading {
    pub date: Option<NaiveDate>,
    pub ph: f64,
    pub organic: f64,
    pub moisture: f64,
    pub temperature: f64,
}

impl From<ReadingRow> for StationReading {
    fn from(row: ReadingRow) -> Self {
        StationReading {
            date: row.monitoring_date,
            ph: decimal_or(row.ph_value, 0.0),
            organic: decimal_or(row.organic_matter, 0.0),
            moisture: decimal_or(row.moisture_content, 0.0),
            temperature: decimal_or(row.temperature, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QualityCountRow {
    pub quality_level: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityCount {
    pub level: Option<String>,
    pub count: i64,
}

impl From<QualityCountRow> for QualityCount {
    fn from(row: QualityCountRow) -> Self {
        QualityCount {
            level: row.quality_level,
            count: row.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsOverview {
    pub total_samples: i64,
    pub provinces_covered: i64,
    pub average_ph: f64,
    pub quality_distribution: Vec<QualityCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_without_measurement_gets_defaults() {
        let record = SampleRecord::from(SampleRow {
            id: 42,
            ..Default::default()
        });

        assert_eq!(record.id, "42");
        assert_eq!(record.name, "采样点");
        assert_eq!(record.value, [0.0, 0.0, 0.0]);
        assert_eq!(record.ph, DEFAULT_MAP_PH);
        assert_eq!(record.nitrogen, 0.0);
        assert_eq!(record.organic, 0.0);
        assert_eq!(record.soil_type, UNKNOWN_SOIL_TYPE);
        assert_eq!(record.remark, "");
    }

    #[test]
    fn test_sample_position_carries_nitrogen_weight() {
        let record = SampleRecord::from(SampleRow {
            id: 1,
            sample_code: Some("SP0001".to_string()),
            region: Some("四川省成都市双流区".to_string()),
            longitude: Some(Decimal::new(1040650, 4)),
            latitude: Some(Decimal::new(305720, 4)),
            nitrogen: Some(Decimal::new(125, 2)),
            ph: Some(Decimal::new(62, 1)),
            ..Default::default()
        });

        assert_eq!(record.id, "SP0001");
        assert_eq!(record.name, "四川省成都市双流区采样点");
        assert!((record.value[0] - 104.065).abs() < 1e-9);
        assert!((record.value[1] - 30.572).abs() < 1e-9);
        assert!((record.value[2] - 1.25).abs() < 1e-9);
        assert!((record.ph - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_sample_serializes_dashboard_field_names() {
        let record = SampleRecord::from(SampleRow::default());
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("pH").is_some());
        assert!(json.get("sampleTime").is_some());
        assert!(json.get("soilType").is_some());
        assert!(json.get("ph").is_none());
    }

    #[test]
    fn test_table_row_defaults_ph_to_zero() {
        let record = TableRecord::from(TableRow {
            id: 7,
            sample_code: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(record.id, "7");
        assert_eq!(record.ph, 0.0);
        assert_eq!(record.location, "");
        assert_eq!(record.texture, UNKNOWN_SOIL_TYPE);
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(0, 10), PageRequest::new(1, 10));
        assert_eq!(PageRequest::new(-3, 0).page_size(), 1);
        assert_eq!(PageRequest::new(1, 50_000).page_size(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert_eq!(PageRequest::default().page_size(), 10);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let request = PageRequest::new(i64::MAX, 10);
        assert_eq!(request.page(), i64::MAX);
        assert_eq!(request.offset(), i64::MAX);

        let request = PageRequest::new(i64::MAX, 50_000);
        assert!(request.offset() >= 0);
    }

    #[test]
    fn test_table_page_metadata() {
        let page = TablePage::new(Vec::new(), 15, PageRequest::new(2, 10));
        assert_eq!(page.total_pages, 2);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalPages"], 2);

        let empty = TablePage::new(Vec::new(), 0, PageRequest::default());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_ph_band_row_labels() {
        let row = PhBandRow { band: 0, count: 3 };
        assert_eq!(
            row.into_distribution(),
            Some(Distribution {
                name: "强酸性(<5.5)".to_string(),
                value: 3
            })
        );
        assert_eq!(PhBandRow { band: 9, count: 1 }.into_distribution(), None);
    }

    #[test]
    fn test_reading_fields_default_independently() {
        let reading = StationReading::from(ReadingRow {
            ph_value: Some(Decimal::new(71, 1)),
            temperature: None,
            ..Default::default()
        });

        assert!((reading.ph - 7.1).abs() < 1e-9);
        assert_eq!(reading.temperature, 0.0);
        assert_eq!(reading.moisture, 0.0);
    }

    #[test]
    fn test_assessment_keeps_column_names() {
        let assessment = QualityAssessment::from(QualityAssessmentRow {
            quality_level: Some("良".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&assessment).unwrap();

        assert_eq!(json["quality_level"], "良");
        assert_eq!(json["quality_score"], 0.0);
        assert!(json["recommendations"].is_null());
    }

    #[test]
    fn test_overview_field_names() {
        let overview = StatisticsOverview {
            total_samples: 3,
            provinces_covered: 0,
            average_ph: DEFAULT_AVERAGE_PH,
            quality_distribution: vec![QualityCount {
                level: Some("优".to_string()),
                count: 3,
            }],
        };
        let json = serde_json::to_value(&overview).unwrap();

        assert_eq!(json["totalSamples"], 3);
        assert_eq!(json["provincesCovered"], 0);
        assert_eq!(json["averagePh"], 7.0);
        assert_eq!(json["qualityDistribution"][0]["level"], "优");
    }
}
