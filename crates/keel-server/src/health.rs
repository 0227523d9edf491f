use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use keel_config::AppConfig;
use keel_health::{HealthAggregator, ReportMetadata};

/// Everything the health endpoint needs, built once at startup
pub struct HealthState {
    aggregator: HealthAggregator,
    app: AppConfig,
    started: Instant,
}

impl HealthState {
    pub fn new(aggregator: HealthAggregator, app: AppConfig) -> Self {
        Self {
            aggregator,
            app,
            started: Instant::now(),
        }
    }

    fn metadata(&self) -> ReportMetadata {
        ReportMetadata {
            name: self.app.name.clone(),
            version: self.app.version.clone(),
            environment: self.app.environment,
            timezone: self.app.timezone.clone(),
            timestamp: jiff::Timestamp::now(),
            uptime: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Health check handler, 200 when every dependency is up and 503 otherwise
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Response {
    let report = state.aggregator.aggregate(state.metadata()).await;
    (report.http_status(), Json(report)).into_response()
}
