use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::QueryError;

/// The read operation a request was serving, used to pick the client-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SoilSamples,
    DataTable,
    RegionNutrientStats,
    PhDistribution,
    TextureStats,
    NutrientTrend,
    QualityAssessment,
    HistoricalData,
    StatisticsOverview,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::SoilSamples => "获取土壤样本数据失败",
            Operation::DataTable => "获取土壤数据表格失败",
            Operation::RegionNutrientStats => "获取区域养分统计失败",
            Operation::PhDistribution => "获取pH分布统计失败",
            Operation::TextureStats => "获取土壤质地统计失败",
            Operation::NutrientTrend => "获取养分趋势数据失败",
            Operation::QualityAssessment => "获取土壤质量评估失败",
            Operation::HistoricalData => "获取历史监测数据失败",
            Operation::StatisticsOverview => "获取统计概况失败",
        }
    }
}

/// Handler error. Always rendered as HTTP 500 with the operation's message;
/// the underlying error is logged, never sent to the client.
#[derive(Debug, thiserror::Error)]
#[error("{op}: {source}", op = .operation.failure_message())]
pub struct ApiError {
    pub operation: Operation,
    pub source: QueryError,
}

impl ApiError {
    /// Adapter for `map_err`
    pub fn during(operation: Operation) -> impl FnOnce(QueryError) -> ApiError {
        move |source| ApiError { operation, source }
    }
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(operation = ?self.operation, error = %self.source, "Request failed");

        let body = json!({ "error": self.operation.failure_message() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hides_database_detail() {
        let err = ApiError::during(Operation::HistoricalData)(QueryError::from(
            sqlx::Error::PoolTimedOut,
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display_names_operation() {
        let err = ApiError::during(Operation::StatisticsOverview)(QueryError::from(
            sqlx::Error::RowNotFound,
        ));
        assert!(err.to_string().starts_with("获取统计概况失败: query failed"));
    }
}
