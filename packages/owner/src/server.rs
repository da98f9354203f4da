//! HTTP surface for owner info requests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::service::{OwnerInfoResponse, PlotOwnerService};

#[derive(Debug, Deserialize)]
pub struct PlotOwnerQuery {
    /// reCAPTCHA response token.
    #[serde(default)]
    pub token: String,
}

/// Build the application router.
pub fn router(service: Arc<PlotOwnerService>) -> Router {
    Router::new()
        .route("/plot_owner/{egrid}", get(plot_owner))
        .route("/ready", get(status_ok))
        .route("/healthz", get(status_ok))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Serve the router on `addr` until Ctrl-C.
pub async fn serve(service: Arc<PlotOwnerService>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn plot_owner(
    State(service): State<Arc<PlotOwnerService>>,
    Path(egrid): Path<String>,
    Query(params): Query<PlotOwnerQuery>,
) -> std::result::Result<Json<OwnerInfoResponse>, StatusCode> {
    // registry and captcha calls block
    let response = tokio::task::spawn_blocking(move || service.info(&egrid, &params.token))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "owner info task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(response))
}

async fn status_ok() -> Json<Value> {
    Json(json!({"status": "OK"}))
}
