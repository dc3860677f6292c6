//! Common routes: health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    let ping = tokio::time::timeout(crate::service::OPERATION_TIMEOUT, state.store().ping()).await;
    match ping {
        Ok(Ok(())) => Ok(Json(ReadyBody {
            status: "ok",
            database: "ok",
        })),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "readiness ping failed");
            Err(degraded())
        }
        Err(_) => {
            tracing::error!("readiness ping timed out");
            Err(degraded())
        }
    }
}

fn degraded() -> (StatusCode, Json<ReadyBody>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadyBody {
            status: "degraded",
            database: "unavailable",
        }),
    )
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready (pings the store), GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
