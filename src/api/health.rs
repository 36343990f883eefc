/// Health and metrics endpoints
use crate::{context::AppContext, error::GatewayResult, metrics};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;

/// Build health routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
}

/// Health check: reports version and database connectivity
async fn health_check(State(ctx): State<AppContext>) -> GatewayResult<Json<serde_json::Value>> {
    crate::db::test_connection(&ctx.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "version": ctx.config.service.version,
    })))
}

/// Prometheus text-format metrics
async fn render_metrics() -> String {
    metrics::render_metrics()
}
