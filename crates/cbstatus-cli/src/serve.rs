//! Pub/Sub push endpoint
//!
//! Every POST to `/` is one invocation of the reporter. Pub/Sub treats any
//! non-2xx answer as a nack and redelivers, whatever the code. Events that
//! cannot be decoded or point at an unparseable mirror URL answer 400, other
//! failures 500, which keeps bad input apart from service outages in logs and
//! alerts.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cbstatus_core::traits::{CommitStatusApi, MirrorLookup};
use cbstatus_core::{Config, StatusReporter};
use std::sync::Arc;

pub fn router<M, G>(reporter: Arc<StatusReporter<M, G>>) -> Router
where
    M: MirrorLookup + 'static,
    G: CommitStatusApi + 'static,
{
    Router::new()
        .route("/", post(push::<M, G>))
        .route("/healthz", get(healthz))
        .with_state(reporter)
}

async fn push<M, G>(
    State(reporter): State<Arc<StatusReporter<M, G>>>,
    body: Bytes,
) -> impl IntoResponse
where
    M: MirrorLookup + 'static,
    G: CommitStatusApi + 'static,
{
    match reporter.report_event(&body).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "event handled");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            tracing::error!(kind = ?e.kind(), %status, "{}", e);
            (
                status,
                Json(serde_json::json!({"error": e.message(), "kind": format!("{:?}", e.kind())})),
            )
                .into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn run(config: Config, addr: &str) -> anyhow::Result<()> {
    let reporter = Arc::new(config.reporter());
    tracing::info!(context = reporter.context(), "starting push endpoint");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {}: {}", addr, e))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(reporter))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("push endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
