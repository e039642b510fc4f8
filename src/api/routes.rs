use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use http::HeaderName;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::config::{ReportingSettings, Settings};
use crate::error::Result;
use crate::observability::{get_metrics, HealthChecker, LatencyTimer, RequestSpan};
use crate::repositories::{
    AgingRepository, LoyaltyRepository, LoyaltySource, MetricRepository, MetricSource,
    OpenItemSource,
};
use crate::services::{AgingService, BusinessHealthService, LoyaltyService, ScoringRegistry};

/// Read-side data access used by the reports.
#[derive(Clone)]
pub struct DataSources {
    pub metrics: Arc<dyn MetricSource>,
    pub open_items: Arc<dyn OpenItemSource>,
    pub loyalty: Arc<dyn LoyaltySource>,
}

impl DataSources {
    /// Postgres-backed sources sharing one pool.
    pub fn postgres(pool: PgPool, settings: &Settings) -> Self {
        Self {
            metrics: Arc::new(MetricRepository::new(pool.clone(), settings.accounting.clone())),
            open_items: Arc::new(AgingRepository::new(pool.clone())),
            loyalty: Arc::new(LoyaltyRepository::new(pool)),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub business_health: Arc<BusinessHealthService>,
    pub aging: Arc<AgingService>,
    pub loyalty: Arc<LoyaltyService>,
    pub scoring: ScoringRegistry,
    pub reporting: ReportingSettings,
    pub metrics_handle: Option<PrometheusHandle>,
    pub health_checker: Option<Arc<HealthChecker>>,
}

impl AppState {
    /// Wires the services over `sources`. Fails if the reporting limits or
    /// the configured scoring, aging or tier tables are invalid.
    pub fn new(sources: DataSources, settings: &Settings) -> Result<Self> {
        let scoring = ScoringRegistry::new(settings.scoring_config()?);
        let reporting = settings.reporting_settings()?;

        Ok(Self {
            business_health: Arc::new(BusinessHealthService::new(
                sources.metrics,
                scoring.clone(),
                &reporting,
            )),
            aging: Arc::new(AgingService::new(
                sources.open_items,
                settings.aging_buckets()?,
                scoring.clone(),
            )),
            loyalty: Arc::new(LoyaltyService::new(
                sources.loyalty,
                settings.tier_table()?,
                settings.loyalty.point_value,
            )),
            scoring,
            reporting,
            metrics_handle: None,
            health_checker: None,
        })
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Adds health checker to the state.
    pub fn with_health_checker(mut self, checker: Arc<HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }
}

async fn track_http_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let timer = LatencyTimer::new();

    let response = next.run(request).await;

    get_metrics().record_http_request(&method, &path, response.status().as_u16(), timer.elapsed_ms());
    response
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // Reports
        .route("/reports/business-health", get(handlers::get_business_health))
        .route("/reports/aging", get(handlers::get_aging_report))
        .route("/reports/loyalty-tiers", get(handlers::get_loyalty_tiers))
        // Scoring settings
        .route("/settings/scoring", get(handlers::get_scoring_settings))
        .route("/settings/thresholds/:metric", put(handlers::update_threshold))
        .route("/settings/weights", put(handlers::update_weights))
        .route_layer(middleware::from_fn(track_http_metrics))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            RequestSpan::from_request(request).span()
        }))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
