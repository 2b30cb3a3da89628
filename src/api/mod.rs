//! HTTP surface - read-only JSON endpoints for the soil dashboard

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult, Operation};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

/// Build the application router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/soil-samples", get(handlers::soil_samples))
        .route("/api/soil-data-table", get(handlers::soil_data_table))
        .route("/api/region-nutrient-stats", get(handlers::region_nutrient_stats))
        .route("/api/ph-distribution-stats", get(handlers::ph_distribution_stats))
        .route("/api/soil-texture-stats", get(handlers::soil_texture_stats))
        .route("/api/nutrient-trend-data", get(handlers::nutrient_trend_data))
        .route(
            "/api/soil-quality-assessment/:sample_id",
            get(handlers::soil_quality_assessment),
        )
        .route("/api/historical-data/:station_id", get(handlers::historical_data))
        .route("/api/statistics-overview", get(handlers::statistics_overview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
