use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::api::requests::{
    AgingQuery, LoyaltyQuery, ReportPeriodQuery, UpdateThresholdRequest, UpdateWeightsRequest,
};
use crate::api::responses::{
    ApiResponse, ErrorResponse, HealthResponse, ServiceHealth, ThresholdUpdateResponse,
    ValidationErrorDetail,
};
use crate::error::AppError;
use crate::models::{
    AgingReport, BusinessHealthReport, HealthWeights, LoyaltyReport, RatioMetric, ScoringConfig,
    ThresholdRule,
};
use crate::observability::AggregatedHealth;

use super::routes::AppState;

type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Maps a service error onto the HTTP error envelope. Internal details are
/// logged, never returned.
fn error_response(err: AppError, action: &str) -> ApiError {
    let (status, code, message) = match err {
        AppError::InvalidPeriod(msg) => (StatusCode::BAD_REQUEST, "INVALID_PERIOD", msg),
        AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        e => {
            tracing::error!("Failed to {}: {}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    };
    (
        status,
        Json(ApiResponse::<()>::error(ErrorResponse::new(code, message))),
    )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = match &state.health_checker {
        Some(checker) => checker.check_database().await.status.is_healthy(),
        None => false,
    };

    let response = HealthResponse {
        status: if db_healthy { "healthy".to_string() } else { "degraded".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        services: ServiceHealth {
            database: db_healthy,
        },
    };

    Json(ApiResponse::success(response))
}

/// Detailed health check with per-dependency latency.
pub async fn detailed_health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AggregatedHealth>>, StatusCode> {
    let checker = state
        .health_checker
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(ApiResponse::success(checker.check_all().await)))
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match &state.health_checker {
        Some(checker) if checker.is_ready().await => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus scrape endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

// ============================================================================
// Report Handlers
// ============================================================================

/// Business health report for the requested period.
pub async fn get_business_health(
    State(state): State<AppState>,
    Query(query): Query<ReportPeriodQuery>,
) -> Result<Json<ApiResponse<BusinessHealthReport>>, ApiError> {
    let period = query
        .resolve(Utc::now().date_naive(), state.reporting.max_period_days)
        .map_err(|e| error_response(e, "resolve report period"))?;

    let report = state.business_health.generate(&period).await;
    Ok(Json(ApiResponse::success(report)))
}

/// Receivables and payables aging.
pub async fn get_aging_report(
    State(state): State<AppState>,
    Query(query): Query<AgingQuery>,
) -> Result<Json<ApiResponse<AgingReport>>, ApiError> {
    let as_of = query
        .resolve(Utc::now().date_naive())
        .map_err(|e| error_response(e, "resolve aging date"))?;

    Ok(Json(ApiResponse::success(state.aging.generate(as_of).await)))
}

/// Loyalty accounts grouped by tier.
pub async fn get_loyalty_tiers(
    State(state): State<AppState>,
    Query(query): Query<LoyaltyQuery>,
) -> Result<Json<ApiResponse<LoyaltyReport>>, ApiError> {
    if let Err(errors) = query.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(ValidationErrorDetail::from_errors(&errors)),
            )),
        ));
    }

    match state.loyalty.generate(query.limit()).await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(e) => Err(error_response(e, "build loyalty tier report")),
    }
}

// ============================================================================
// Scoring Settings Handlers
// ============================================================================

/// Current thresholds, weights and health score bands.
pub async fn get_scoring_settings(
    State(state): State<AppState>,
) -> Json<ApiResponse<ScoringConfig>> {
    Json(ApiResponse::success(state.scoring.snapshot().await))
}

/// Replaces the threshold rule of one metric.
pub async fn update_threshold(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Json(request): Json<UpdateThresholdRequest>,
) -> Result<Json<ApiResponse<ThresholdUpdateResponse>>, ApiError> {
    let metric: RatioMetric = metric
        .parse()
        .map_err(|e| error_response(e, "parse threshold metric"))?;
    let rule = ThresholdRule::from(request);

    match state.scoring.update_threshold(metric, rule).await {
        Ok(previous) => Ok(Json(ApiResponse::success(ThresholdUpdateResponse {
            metric,
            rule,
            previous,
        }))),
        Err(e) => Err(error_response(e, "update threshold")),
    }
}

/// Replaces the whole health score weight table.
pub async fn update_weights(
    State(state): State<AppState>,
    Json(request): Json<UpdateWeightsRequest>,
) -> Result<Json<ApiResponse<HealthWeights>>, ApiError> {
    let weights = request
        .into_weights()
        .map_err(|e| error_response(e, "update weights"))?;

    state.scoring.replace_weights(weights.clone()).await;
    Ok(Json(ApiResponse::success(weights)))
}
