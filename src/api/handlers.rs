use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult, Operation};
use super::AppState;
use crate::query::aggregate::{self, DEFAULT_TREND_MONTHS};
use crate::query::lookup::{self, DEFAULT_HISTORY_DAYS};
use crate::query::utils::empty_as_none;
use crate::query::{overview, samples};
use crate::query::{
    Distribution, PageRequest, QualityAssessment, RegionNutrientStats, SampleFilters,
    SampleRecord, StationReading, StatisticsOverview, TableFilters, TablePage, TrendPoint,
};

#[derive(Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
}

/// `?page=&pageSize=` for the data table
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page_size: Option<i64>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest::new(
            params.page.unwrap_or(PageRequest::DEFAULT_PAGE),
            params.page_size.unwrap_or(PageRequest::DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub months: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_range: Option<i32>,
}

pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        status: "ok".to_string(),
        message: "土壤数据API服务正常运行".to_string(),
    })
}

pub async fn soil_samples(
    State(state): State<AppState>,
    Query(filters): Query<SampleFilters>,
) -> ApiResult<Json<Vec<SampleRecord>>> {
    let samples = samples::list_samples(&state.db, &filters)
        .await
        .map_err(ApiError::during(Operation::SoilSamples))?;
    Ok(Json(samples))
}

pub async fn soil_data_table(
    State(state): State<AppState>,
    Query(paging): Query<PageParams>,
    Query(filters): Query<TableFilters>,
) -> ApiResult<Json<TablePage>> {
    let page = samples::data_table(&state.db, paging.into(), &filters)
        .await
        .map_err(ApiError::during(Operation::DataTable))?;
    Ok(Json(page))
}

pub async fn region_nutrient_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RegionNutrientStats>>> {
    let stats = aggregate::region_nutrient_stats(&state.db)
        .await
        .map_err(ApiError::during(Operation::RegionNutrientStats))?;
    Ok(Json(stats))
}

pub async fn ph_distribution_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Distribution>>> {
    let histogram = aggregate::ph_distribution(&state.db)
        .await
        .map_err(ApiError::during(Operation::PhDistribution))?;
    Ok(Json(histogram))
}

pub async fn soil_texture_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Distribution>>> {
    let textures = aggregate::texture_distribution(&state.db)
        .await
        .map_err(ApiError::during(Operation::TextureStats))?;
    Ok(Json(textures))
}

pub async fn nutrient_trend_data(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    let months = params.months.unwrap_or(DEFAULT_TREND_MONTHS);
    let trend = aggregate::nutrient_trend(&state.db, months)
        .await
        .map_err(ApiError::during(Operation::NutrientTrend))?;
    Ok(Json(trend))
}

/// Responds with `null` when the sample has no assessment
pub async fn soil_quality_assessment(
    State(state): State<AppState>,
    Path(sample_id): Path<String>,
) -> ApiResult<Json<Option<QualityAssessment>>> {
    let assessment = lookup::quality_assessment(&state.db, &sample_id)
        .await
        .map_err(ApiError::during(Operation::QualityAssessment))?;
    Ok(Json(assessment))
}

pub async fn historical_data(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<StationReading>>> {
    let days = params.date_range.unwrap_or(DEFAULT_HISTORY_DAYS);
    let readings = lookup::station_history(&state.db, &station_id, days)
        .await
        .map_err(ApiError::during(Operation::HistoricalData))?;
    Ok(Json(readings))
}

pub async fn statistics_overview(
    State(state): State<AppState>,
) -> ApiResult<Json<StatisticsOverview>> {
    let overview = overview::statistics_overview(&state.db)
        .await
        .map_err(ApiError::during(Operation::StatisticsOverview))?;
    Ok(Json(overview))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_default() {
        let request: PageRequest = PageParams::default().into();
        assert_eq!(request, PageRequest::new(1, 10));
    }

    #[test]
    fn test_page_params_are_clamped() {
        let request: PageRequest = PageParams {
            page: Some(0),
            page_size: Some(-4),
        }
        .into();
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 1);
        assert_eq!(request.offset(), 0);
    }
}
