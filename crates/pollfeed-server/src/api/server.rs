//! HTTP surface for the query service.
//!
//! One endpoint (`/` or `/api`) selects the operation with `?action=`.
//! Every response is `200 OK` with a JSON envelope; failures are reported
//! through `ok: false`.

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::Method;
use axum::routing::{any, get};
use axum::{Json, Router};
use pollfeed_core::protocol::failure;
use pollfeed_core::FeedError;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api::service::QueryService;
use crate::config::ServerConfig;
use crate::db::MessageLog;

pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/", any(handle_action))
        .route("/api", any(handle_action))
        .route("/health", get(health))
        .with_state(service)
}

async fn handle_action(
    State(service): State<QueryService>,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Json<Value> {
    let Ok(Query(params)) = query else {
        return Json(failure(&FeedError::InvalidRequest.to_string()));
    };

    // Store calls are blocking; keep them off the async workers.
    let reply = tokio::task::spawn_blocking(move || service.handle(method.as_str(), &params, &body))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "request handler panicked");
            failure("Request handling failed.")
        });
    Json(reply)
}

async fn health(State(service): State<QueryService>) -> Json<Value> {
    let reply = tokio::task::spawn_blocking(move || service.health())
        .await
        .unwrap_or_else(|_| failure("Health check failed."));
    Json(reply)
}

/// Open the configured log and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let log = MessageLog::open(&config.db_path)?;
    let service = QueryService::new(Arc::new(log));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(
        addr = %config.bind,
        db = %config.db_path.display(),
        "pollfeed server listening"
    );

    serve_on(listener, service, shutdown_signal()).await
}

/// Serve `service` on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, service: QueryService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server shutdown")?;
    tracing::info!("pollfeed server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
